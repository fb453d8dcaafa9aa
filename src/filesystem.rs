//! Walking lecture directories and creating new lectures.
//!
//! A lecture root contains chapter directories such as `k01`, `v01` or
//! `anh01`, each holding chapter files with the same prefix.

use crate::config::{
    valid_prefixes, LectureMetaData, MetaInfo, Translate, CONF_FILE_NAME, IMAGE_DIRECTORIES,
};
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A walked directory: its path, the names of its sub directories and the
/// names of its files.
pub type WalkEntry = (PathBuf, Vec<String>, Vec<String>);

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Check whether the last component of `name` starts with a chapter prefix
/// followed by a digit, e.g. `k01` or `anh02.md`.
pub fn valid_file_bgn(name: impl AsRef<Path>) -> bool {
    let name = file_name(name.as_ref());
    valid_prefixes().any(|prefix| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Breadth-first directory walker which skips image and version control
/// directories.
#[derive(Debug, Clone)]
pub struct FileWalker {
    path: PathBuf,
    blacklist: Vec<String>,
    endings: Vec<String>,
    ignore_non_chapter_prefixed: bool,
}

impl FileWalker {
    /// Create a walker for `path`, picking up MarkDown files in chapter
    /// directories.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            blacklist: ["quell", ".svn", ".git", "bilder", "images"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            endings: vec!["md".into()],
            ignore_non_chapter_prefixed: true,
        }
    }

    /// Skip additional directories (matched as case-insensitive prefix).
    pub fn with_blacklisted<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist.extend(names.into_iter().map(Into::into));
        self
    }

    /// Set the file endings to pick up.
    pub fn with_endings<I, S>(mut self, endings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endings = endings.into_iter().map(Into::into).collect();
        self
    }

    /// Whether files and directories without chapter prefix are skipped.
    pub fn with_ignore_non_chapter_prefixed(mut self, ignore: bool) -> Self {
        self.ignore_non_chapter_prefixed = ignore;
        self
    }

    fn interesting_dir(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        !self.blacklist.iter().any(|bad| name.starts_with(bad.as_str()))
    }

    fn interesting_file(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.endings.iter().any(|e| name.ends_with(e.as_str()))
    }

    /// Walk the tree. Entries are sorted per directory; a file path yields a
    /// single entry for its parent directory.
    pub fn walk(&self) -> Result<Vec<WalkEntry>> {
        if !self.path.exists() {
            return Err(Error::structural(
                "specified directory does not exist",
                &self.path,
            ));
        }
        if self.path.is_file() {
            let parent = match self.path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            return Ok(vec![(parent, Vec::new(), vec![file_name(&self.path)])]);
        }

        let mut result = Vec::new();
        let mut queue = vec![self.path.clone()];
        let mut idx = 0;
        while idx < queue.len() {
            let dir = queue[idx].clone();
            idx += 1;
            log::debug!("walking {}", dir.display());
            let mut files = Vec::new();
            let mut dirs = Vec::new();
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let path = entry.path();
                if self.ignore_non_chapter_prefixed && !valid_file_bgn(&name) {
                    continue;
                }
                if path.is_dir() {
                    if self.interesting_dir(&name) {
                        dirs.push(name);
                    }
                } else if path.is_file() && self.interesting_file(&name) {
                    files.push(name);
                }
            }
            files.sort();
            dirs.sort();
            queue.extend(dirs.iter().map(|d| dir.join(d)));
            result.push((dir, dirs, files));
        }
        Ok(result)
    }
}

/// Walk `dir` for MarkDown files. Unless `all_markdown_files` is set, only
/// chapter files are reported.
pub fn get_markdown_files(dir: impl AsRef<Path>, all_markdown_files: bool) -> Result<Vec<WalkEntry>> {
    FileWalker::new(dir.as_ref())
        .with_ignore_non_chapter_prefixed(!all_markdown_files)
        .with_endings([".md"])
        .walk()
}

/// Check whether `dir` is the root of a lecture: it has no chapter prefix
/// itself and contains a chapter directory or a configuration file.
pub fn is_lecture_root(dir: impl AsRef<Path>) -> bool {
    let dir = dir.as_ref();
    let dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
    if valid_file_bgn(&dir) || !dir.is_dir() {
        return false;
    }
    if dir.join(CONF_FILE_NAME).is_file() {
        return true;
    }
    fs::read_dir(&dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.path().is_dir() && valid_file_bgn(e.file_name()))
        })
        .unwrap_or(false)
}

/// Find the lecture root for `path` by walking up the directory tree.
pub fn get_lecture_root(path: impl AsRef<Path>) -> Option<PathBuf> {
    let path = path.as_ref();
    let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let start = if path.is_file() { path.parent()? } else { path.as_path() };
    start
        .ancestors()
        .find(|dir| is_lecture_root(dir))
        .map(Path::to_path_buf)
}

/// Check whether `path` (file or directory) belongs to a lecture.
pub fn is_within_lecture(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    if !path.exists() {
        return false;
    }
    let path = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let dir = if path.is_file() {
        match path.parent() {
            Some(parent) => parent.to_path_buf(),
            None => return false,
        }
    } else {
        path
    };
    if valid_file_bgn(&dir) {
        return true;
    }
    let name = file_name(&dir).to_lowercase();
    if IMAGE_DIRECTORIES.contains(&name.as_str()) && dir.parent().is_some_and(|p| valid_file_bgn(p)) {
        return true;
    }
    is_lecture_root(&dir)
}

/// Replace the `.md` ending of a file name by the ending of `format`.
pub fn fn2targetformat(path: impl AsRef<Path>, format: &str) -> Result<PathBuf> {
    let path = path.as_ref();
    match path.extension() {
        Some(ext) if ext == "md" => Ok(path.with_extension(format)),
        _ => Err(Error::structural("file must end on .md", path)),
    }
}

/// Creates the directory structure of a new lecture.
#[derive(Debug, Clone)]
pub struct InitLecture {
    path: PathBuf,
    chapters: u32,
    language: String,
    appendix_count: u32,
    preface: bool,
    papers: bool,
}

impl InitLecture {
    /// Prepare a lecture with `chapters` main chapters at `path`.
    pub fn new(path: impl Into<PathBuf>, chapters: u32, language: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            chapters,
            language: language.into(),
            appendix_count: 0,
            preface: false,
            papers: false,
        }
    }

    /// Number of appendix chapters to create.
    pub fn with_appendix_count(mut self, count: u32) -> Self {
        self.appendix_count = count;
        self
    }

    /// Create a preface chapter.
    pub fn with_preface(mut self, preface: bool) -> Self {
        self.preface = preface;
        self
    }

    /// Use exercise sheets (`blattNN`) instead of chapters (`kNN`).
    pub fn with_papers(mut self, papers: bool) -> Self {
        self.papers = papers;
        self
    }

    fn create_chapter(&self, prefix: &str, number: u32, title: &str) -> Result<PathBuf> {
        let name = format!("{}{:02}", prefix, number);
        let dir = self.path.join(&name);
        fs::create_dir_all(&dir)?;
        let file = dir.join(format!("{}.md", name));
        let heading = format!("{} {}", title, number);
        let underline = "=".repeat(heading.chars().count());
        fs::write(&file, format!("{}\n{}\n\n", heading, underline))?;
        Ok(file)
    }

    /// Create the chapters and write an initial configuration. Returns the
    /// created chapter files.
    pub fn generate_structure(&self) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.path)?;
        let mut conf = LectureMetaData::new(self.path.join(CONF_FILE_NAME));
        conf.set(MetaInfo::Language, self.language.clone());
        conf.write()?;

        let translate = Translate::new(&self.language);
        let mut created = Vec::new();
        if self.preface {
            created.push(self.create_chapter("v", 1, &translate.get("preface"))?);
        }
        let (prefix, title) = if self.papers {
            ("blatt", translate.get("paper"))
        } else {
            ("k", translate.get("chapter"))
        };
        for number in 1..=self.chapters {
            created.push(self.create_chapter(prefix, number, &title)?);
        }
        let appendix = translate.get("appendix");
        for number in 1..=self.appendix_count {
            created.push(self.create_chapter("anh", number, &appendix)?);
        }
        log::debug!("created {} chapter files in {}", created.len(), self.path.display());
        Ok(created)
    }
}
