//! Table of contents generation.
//!
//! [`HeadingIndexer`] collects the headings of all chapter files,
//! [`TocFormatter`] turns them into a MarkDown table of contents with
//! enumerated, linked entries.

use crate::config::{ConfFactory, LectureMetaData, MetaInfo, Translate};
use crate::error::{Error, Result};
use crate::filesystem::get_markdown_files;
use crate::model::{ChapterGroup, Heading, HeadingType};
use crate::parser::{extract_headings, file2paragraphs, Paragraphs};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Headings of all chapter files, keyed by file path.
pub type HeadingIndex = BTreeMap<PathBuf, Vec<Heading>>;

/// Collects headings from the chapter files of a lecture.
#[derive(Debug)]
pub struct HeadingIndexer {
    path: PathBuf,
    index: HeadingIndex,
}

impl HeadingIndexer {
    /// Create an indexer for the lecture at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::structural("directory does not exist", &path));
        }
        Ok(Self {
            path,
            index: HeadingIndex::new(),
        })
    }

    /// Build the index. Nothing is collected if the lecture disables the table
    /// of contents.
    pub fn walk(&mut self) -> Result<()> {
        let conf = ConfFactory::new().get_conf_instance(&self.path)?;
        if !conf.get_bool(MetaInfo::GenerateToc) {
            return Ok(());
        }
        let translate = Translate::new(conf.get(MetaInfo::Language));
        for (dir, _, files) in get_markdown_files(&self.path, false)? {
            let kind = dir
                .file_name()
                .and_then(|n| ChapterGroup::of(&n.to_string_lossy()))
                .map_or(HeadingType::Normal, |group| match group {
                    ChapterGroup::Preface => HeadingType::Preface,
                    ChapterGroup::Main => HeadingType::Normal,
                    ChapterGroup::Appendix => HeadingType::Appendix,
                });
            for file in files {
                let path = dir.join(&file);
                let mut headings = retrieve_headings(&path, &translate)?;
                for heading in &mut headings {
                    heading.kind = kind;
                }
                self.index.insert(path, headings);
            }
        }
        Ok(())
    }

    /// Check whether no headings were collected.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Collected headings, sorted by path.
    pub fn get_index(&self) -> &HeadingIndex {
        &self.index
    }

    /// Consume the indexer, returning the index.
    pub fn into_index(self) -> HeadingIndex {
        self.index
    }
}

fn retrieve_headings(path: &Path, translate: &Translate) -> Result<Vec<Heading>> {
    let text = fs::read_to_string(path)?;
    let paragraphs = file2paragraphs(&text, false);
    let mut headings = extract_headings(path, &paragraphs)?;
    if !was_edited(&paragraphs, &headings) {
        let marker = translate.get("not edited");
        for heading in &mut headings {
            heading.text = format!("{} ({})", heading.text, marker);
        }
    }
    Ok(headings)
}

/// A file counts as edited once it contains anything but headings.
fn was_edited(paragraphs: &Paragraphs, headings: &[Heading]) -> bool {
    let is_heading_line = |start: &usize| headings.iter().any(|h| h.line_number == *start);
    let all_hashed = |lines: &[String]| lines.iter().all(|l| l.starts_with('#'));
    paragraphs.iter().any(|(start, lines)| match lines.len() {
        0 => false,
        1 => !is_heading_line(start),
        2 => {
            let underlined = lines[1].contains("----") || lines[1].contains("====");
            !all_hashed(lines) && !(underlined && is_heading_line(start))
        }
        _ => !all_hashed(lines),
    })
}

/// Computes section numbers like `2.1` from a sequence of headings.
#[derive(Debug, Clone, Default)]
pub struct ChapterNumberEnumerator {
    registered: [u32; Self::MAX_DEPTH],
    last_chapter: Option<u32>,
}

impl ChapterNumberEnumerator {
    /// Deepest heading level
    pub const MAX_DEPTH: usize = 6;

    /// Create a new enumerator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next heading. The heading must carry a chapter number.
    pub fn register(&mut self, heading: &Heading) -> Result<()> {
        let chapter = heading.chapter_number.ok_or_else(|| {
            Error::Other(format!("heading \"{}\" has no chapter number", heading.text))
        })?;
        if self.last_chapter != Some(chapter) {
            self.registered = [0; Self::MAX_DEPTH];
            self.registered[0] = chapter;
            self.last_chapter = Some(chapter);
        }
        let level = usize::from(heading.level).clamp(1, Self::MAX_DEPTH);
        if level > 1 {
            self.registered[level - 1] += 1;
            for counter in &mut self.registered[level..] {
                *counter = 0;
            }
        }
        Ok(())
    }

    /// Enumeration of the last registered heading, e.g. `[2, 1]`.
    pub fn get_heading_enumeration(&self) -> Vec<u32> {
        let len = self
            .registered
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |i| i + 1);
        self.registered[..len].to_vec()
    }
}

/// A heading of the table of contents: its enumeration, the heading and the
/// file path relative to the lecture root.
type TocEntry = (Vec<u32>, Heading, String);

/// Formats a [`HeadingIndex`] as MarkDown table of contents.
#[derive(Debug)]
pub struct TocFormatter {
    conf: LectureMetaData,
    root: PathBuf,
    preface: Vec<TocEntry>,
    main: Vec<TocEntry>,
    appendix: Vec<TocEntry>,
}

impl TocFormatter {
    /// Create a formatter for the lecture at `path`, reading its
    /// configuration.
    pub fn new(index: &HeadingIndex, path: impl AsRef<Path>) -> Result<Self> {
        let conf = ConfFactory::new().get_conf_instance(path.as_ref())?;
        Self::with_conf(index, conf)
    }

    /// Create a formatter using the given configuration. Optional files such
    /// as `titel.md` are looked up next to the configuration file.
    pub fn with_conf(index: &HeadingIndex, conf: LectureMetaData) -> Result<Self> {
        let root = conf
            .path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut formatter = Self {
            conf,
            root,
            preface: Vec::new(),
            main: Vec::new(),
            appendix: Vec::new(),
        };
        if formatter.conf.get_bool(MetaInfo::GenerateToc) {
            formatter.build_index(index)?;
        }
        Ok(formatter)
    }

    fn build_index(&mut self, index: &HeadingIndex) -> Result<()> {
        let depth = self.conf.get_number(MetaInfo::TocDepth)?;
        let mut preface = ChapterNumberEnumerator::new();
        let mut main = ChapterNumberEnumerator::new();
        let mut appendix = ChapterNumberEnumerator::new();
        for (path, headings) in index {
            let relative = relative_link(path);
            for heading in headings {
                if usize::from(heading.level) > depth {
                    continue;
                }
                let (enumerator, entries) = match heading.kind {
                    HeadingType::Preface => (&mut preface, &mut self.preface),
                    HeadingType::Normal => (&mut main, &mut self.main),
                    HeadingType::Appendix => (&mut appendix, &mut self.appendix),
                };
                enumerator.register(heading)?;
                entries.push((
                    enumerator.get_heading_enumeration(),
                    heading.clone(),
                    relative.clone(),
                ));
            }
        }
        Ok(())
    }

    fn optional_file(&self, name: &str) -> bool {
        self.root.join(name).exists() || self.root.join(name.to_lowercase()).exists()
    }

    /// Render the table of contents. Returns an empty string if the lecture
    /// disables the table of contents.
    pub fn format(&self) -> String {
        if !self.conf.get_bool(MetaInfo::GenerateToc) {
            return String::new();
        }
        let t = Translate::new(self.conf.get(MetaInfo::Language));
        let ext = self.conf.get(MetaInfo::Format);
        let title = format!(
            "{} - {}",
            t.get("table of contents"),
            self.conf.get(MetaInfo::LectureTitle)
        );
        let mut output = format!("{}\n{}\n\n", title, "=".repeat(title.chars().count()));

        if self.optional_file("titel.md") {
            output.push_str(&format!("[{}](titel.{})\n\n", t.get("title page"), ext));
        }
        if !self.preface.is_empty() {
            output.push_str(&self.format_section(Some(&t.get("preface")), &self.preface));
        }
        let chapters_title = (!self.preface.is_empty()).then(|| t.get("chapters"));
        output.push_str(&self.format_section(chapters_title.as_deref(), &self.main));
        if !self.appendix.is_empty() {
            let appendix_title = (!self.conf.get_bool(MetaInfo::AppendixPrefix))
                .then(|| t.get("appendix"));
            output.push_str(&self.format_section(appendix_title.as_deref(), &self.appendix));
        }
        output.push_str("\n\n");

        let extras: Vec<String> = [
            ("glossar", "glossary"),
            ("index", "index"),
            ("kurz", "abbreviations"),
            ("taktil", "tactile materials"),
            ("copyright", "copyright"),
        ]
        .iter()
        .filter(|(file, _)| self.optional_file(&format!("{}.md", file)))
        .map(|(file, phrase)| format!("[{}]({}.{})", t.get(phrase), file, ext))
        .collect();
        if !extras.is_empty() {
            output.push_str(&extras.join("\\\n"));
            output.push('\n');
        }

        if self.optional_file("info.md") {
            output.push_str(&format!(
                "\n\n* * * * *\n\n[{}](info.{})\n",
                t.get("remarks about the accessible version"),
                ext
            ));
        }
        output.push('\n');
        output
    }

    fn format_section(&self, title: Option<&str>, entries: &[TocEntry]) -> String {
        let mut chunks = String::new();
        if let Some(title) = title {
            chunks.push_str(&format!("{}\n{}\n\n", title, "-".repeat(title.chars().count())));
        }
        let links: Vec<String> = entries
            .iter()
            .map(|(numbers, heading, path)| format!("\n{}", self.heading2toclink(numbers, heading, path)))
            .collect();
        chunks.push_str(&links.join("\\"));
        chunks.push_str("\n\n");
        chunks
    }

    fn heading2toclink(&self, numbers: &[u32], heading: &Heading, path: &str) -> String {
        let prefix = if heading.kind == HeadingType::Appendix
            && self.conf.get_bool(MetaInfo::AppendixPrefix)
        {
            "A."
        } else {
            ""
        };
        let numbers: Vec<String> = numbers.iter().map(u32::to_string).collect();
        let target = match path.strip_suffix(".md") {
            Some(stem) => format!("{}.{}", stem, self.conf.get(MetaInfo::Format)),
            None => path.to_string(),
        };
        format!(
            "[{}{}. {}]({}#{})",
            prefix,
            numbers.join("."),
            heading.text,
            target,
            heading.id()
        )
    }
}

/// `dir/file.md` relative to the lecture root, as used in links.
fn relative_link(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.parent().and_then(Path::file_name) {
        Some(dir) => format!("{}/{}", dir.to_string_lossy(), file),
        None => file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONF_FILE_NAME;
    use tempfile::tempdir;

    fn h(text: &str, level: u8, chapter: u32) -> Heading {
        Heading::new(text, level).with_chapter_number(chapter)
    }

    #[test]
    fn test_chapters_are_enumerated_subsequently() {
        let mut c = ChapterNumberEnumerator::new();
        for i in 1..=10 {
            c.register(&h("stuff", 1, i)).unwrap();
            assert_eq!(c.get_heading_enumeration(), vec![i]);
        }
    }

    #[test]
    fn test_sections_are_enumerated_within_chapters() {
        let mut c = ChapterNumberEnumerator::new();
        c.register(&h("absolute h1", 1, 1)).unwrap();
        assert_eq!(c.get_heading_enumeration(), vec![1]);
        for i in 1..=5 {
            c.register(&h("stuff", 2, 1)).unwrap();
            assert_eq!(c.get_heading_enumeration(), vec![1, i]);
        }
        c.register(&h("absolute h1", 1, 2)).unwrap();
        assert_eq!(c.get_heading_enumeration(), vec![2]);
        c.register(&h("sub", 2, 2)).unwrap();
        c.register(&h("subsub", 3, 2)).unwrap();
        assert_eq!(c.get_heading_enumeration(), vec![2, 1, 1]);
        c.register(&h("sub", 2, 2)).unwrap();
        assert_eq!(c.get_heading_enumeration(), vec![2, 2]);
    }

    #[test]
    fn test_heading_without_chapter_is_rejected() {
        let mut c = ChapterNumberEnumerator::new();
        assert!(c.register(&Heading::new("h1 without chapter", 1)).is_err());
    }

    #[test]
    fn test_unedited_files_are_marked() {
        let pars = file2paragraphs("Kapitel 1\n=========\n\n## Abschnitt\n", false);
        let headings = extract_headings("k01.md", &pars).unwrap();
        assert!(!was_edited(&pars, &headings));

        let pars = file2paragraphs("# Kapitel 1\n\nSome text.\n", false);
        let headings = extract_headings("k01.md", &pars).unwrap();
        assert!(was_edited(&pars, &headings));
    }

    fn lecture() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for (dir, file, content) in [
            ("v01", "v01.md", "# Vorwort\n\nText.\n"),
            ("k01", "k01.md", "# Einleitung\n\nText.\n\n## Motivation\n\nText.\n"),
            ("k02", "k02.md", "# Grundlagen\n"),
            ("anh01", "anh01.md", "# Literatur\n\nText.\n"),
        ] {
            fs::create_dir_all(root.join(dir)).unwrap();
            fs::write(root.join(dir).join(file), content).unwrap();
        }
        let mut conf = LectureMetaData::new(root.join(CONF_FILE_NAME));
        conf.set(MetaInfo::LectureTitle, "Testvorlesung");
        conf.write().unwrap();
        dir
    }

    #[test]
    fn test_indexer_assigns_heading_types() {
        let dir = lecture();
        let mut indexer = HeadingIndexer::new(dir.path()).unwrap();
        indexer.walk().unwrap();
        let index = indexer.get_index();
        assert_eq!(index.len(), 4);
        let appendix = &index[&dir.path().join("anh01").join("anh01.md")];
        assert_eq!(appendix[0].kind, HeadingType::Appendix);
        let preface = &index[&dir.path().join("v01").join("v01.md")];
        assert_eq!(preface[0].kind, HeadingType::Preface);
        let unedited = &index[&dir.path().join("k02").join("k02.md")];
        assert_eq!(unedited[0].text, "Grundlagen (nicht bearbeitet)");
    }

    #[test]
    fn test_format_toc() {
        let dir = lecture();
        fs::write(dir.path().join("glossar.md"), "# Glossar\n").unwrap();
        let mut indexer = HeadingIndexer::new(dir.path()).unwrap();
        indexer.walk().unwrap();
        let toc = TocFormatter::new(indexer.get_index(), dir.path())
            .unwrap()
            .format();
        assert!(toc.starts_with("Inhalt - Testvorlesung\n======================\n\n"));
        assert!(toc.contains("Vorwort\n-------\n\n\n[1. Vorwort](v01/v01.html#vorwort)"));
        assert!(toc.contains("Kapitel\n-------"));
        assert!(toc.contains("[1. Einleitung](k01/k01.html#einleitung)\\\n[1.1. Motivation]"));
        assert!(toc.contains("[1. Literatur](anh01/anh01.html#literatur)"));
        assert!(toc.contains("Anhang\n------"));
        assert!(toc.contains("[Glossar](glossar.html)\n"));
        assert!(!toc.contains("info.html"));
    }

    #[test]
    fn test_appendix_prefix_and_depth() {
        let dir = lecture();
        let mut conf = ConfFactory::new().get_conf_instance(dir.path()).unwrap();
        conf.set(MetaInfo::AppendixPrefix, "1");
        conf.set(MetaInfo::TocDepth, "1");
        conf.write().unwrap();
        let mut indexer = HeadingIndexer::new(dir.path()).unwrap();
        indexer.walk().unwrap();
        let toc = TocFormatter::new(indexer.get_index(), dir.path())
            .unwrap()
            .format();
        assert!(toc.contains("[A.1. Literatur]"));
        assert!(!toc.contains("Anhang\n"));
        assert!(!toc.contains("Motivation"));
    }

    #[test]
    fn test_disabled_toc() {
        let dir = lecture();
        let mut conf = ConfFactory::new().get_conf_instance(dir.path()).unwrap();
        conf.set(MetaInfo::GenerateToc, "0");
        conf.write().unwrap();
        let mut indexer = HeadingIndexer::new(dir.path()).unwrap();
        indexer.walk().unwrap();
        assert!(indexer.is_empty());
        let toc = TocFormatter::new(indexer.get_index(), dir.path()).unwrap();
        assert_eq!(toc.format(), "");
    }
}
