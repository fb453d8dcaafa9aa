//! Ordered cache of all chapter files of a lecture.

use crate::config::{APPENDIX_PREFIXES, MAIN_PREFIXES, PREFACE_PREFIXES};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// A chapter file: its directory and its file name.
pub type CachedFile = (PathBuf, String);

/// Lecture part a chapter file belongs to, in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChapterGroup {
    /// Preface (`v01`, ...)
    Preface,
    /// Main chapters (`k01`, `blatt01`, ...)
    Main,
    /// Appendix (`anh01`, ...)
    Appendix,
}

impl ChapterGroup {
    /// Classify a file or directory name by its prefix. The prefix must be
    /// followed by a digit.
    pub fn of(name: &str) -> Option<Self> {
        let matches = |prefixes: &[&str]| {
            prefixes.iter().any(|p| {
                name.strip_prefix(p)
                    .and_then(|rest| rest.chars().next())
                    .is_some_and(|c| c.is_ascii_digit())
            })
        };
        if matches(APPENDIX_PREFIXES) {
            Some(ChapterGroup::Appendix)
        } else if matches(PREFACE_PREFIXES) {
            Some(ChapterGroup::Preface)
        } else if matches(MAIN_PREFIXES) {
            Some(ChapterGroup::Main)
        } else {
            None
        }
    }
}

/// All chapter files of a lecture, grouped into preface, main part and
/// appendix so that the previous and next file of any chapter can be looked up.
#[derive(Debug, Clone, Default)]
pub struct FileCache {
    preface: Vec<CachedFile>,
    main: Vec<CachedFile>,
    appendix: Vec<CachedFile>,
}

impl FileCache {
    /// Build the cache from walked `(directory, subdirectories, files)`
    /// entries. Files with an invalid chapter prefix are rejected.
    pub fn new<I, D, F>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (D, Vec<String>, Vec<F>)>,
        D: AsRef<Path>,
        F: AsRef<str>,
    {
        let mut cache = Self::default();
        for (dir, _, files) in entries {
            for file in files {
                let file = file.as_ref();
                let entry = (dir.as_ref().to_path_buf(), file.to_string());
                match ChapterGroup::of(file) {
                    Some(ChapterGroup::Preface) => cache.preface.push(entry),
                    Some(ChapterGroup::Main) => cache.main.push(entry),
                    Some(ChapterGroup::Appendix) => cache.appendix.push(entry),
                    None => {
                        return Err(Error::structural(
                            "file does not start with a valid chapter prefix",
                            dir.as_ref().join(file),
                        ))
                    }
                }
            }
        }
        cache.preface.sort();
        cache.main.sort();
        cache.appendix.sort();
        Ok(cache)
    }

    /// Files of the given group.
    pub fn group(&self, group: ChapterGroup) -> &[CachedFile] {
        match group {
            ChapterGroup::Preface => &self.preface,
            ChapterGroup::Main => &self.main,
            ChapterGroup::Appendix => &self.appendix,
        }
    }

    /// All files in reading order.
    pub fn all_files(&self) -> impl Iterator<Item = &CachedFile> {
        self.preface
            .iter()
            .chain(self.main.iter())
            .chain(self.appendix.iter())
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.preface.len() + self.main.len() + self.appendix.len()
    }

    /// Check whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check whether a file with the given name is cached.
    pub fn contains(&self, file_name: &str) -> bool {
        self.all_files().any(|(_, f)| f == file_name)
    }

    /// Previous and next chapter file for `path`, looked up by file name and
    /// the name of its directory.
    pub fn get_neighbours_for(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<(Option<&CachedFile>, Option<&CachedFile>)> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir_name = path
            .parent()
            .and_then(Path::file_name)
            .map(|d| d.to_string_lossy().into_owned());
        let files: Vec<&CachedFile> = self.all_files().collect();
        let index = files
            .iter()
            .position(|(dir, file)| {
                *file == file_name
                    && match &dir_name {
                        Some(d) => dir.file_name().is_some_and(|n| n.to_string_lossy() == *d),
                        None => true,
                    }
            })
            .ok_or_else(|| Error::structural("file is not part of the lecture", path))?;
        let previous = index.checked_sub(1).map(|i| files[i]);
        let next = files.get(index + 1).copied();
        Ok((previous, next))
    }
}

impl<'a> IntoIterator for &'a FileCache {
    type Item = &'a CachedFile;
    type IntoIter = Box<dyn Iterator<Item = &'a CachedFile> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.all_files())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dir: &str, files: &[&str]) -> (PathBuf, Vec<String>, Vec<String>) {
        (
            PathBuf::from(dir),
            Vec::new(),
            files.iter().map(|f| f.to_string()).collect(),
        )
    }

    fn cached(dir: &str, file: &str) -> CachedFile {
        (PathBuf::from(dir), file.to_string())
    }

    #[test]
    fn test_all_files_are_contained() {
        let cache = FileCache::new(vec![
            entry("anh03", &["anh0301.md", "anh0302.md"]),
            entry("k20", &["k20.md"]),
            entry("anh04", &["anh04.md"]),
        ])
        .unwrap();
        for file in ["anh0301.md", "anh0302.md", "k20.md", "anh04.md"] {
            assert!(cache.contains(file), "{} should be cached", file);
        }
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_files_are_grouped() {
        let cache = FileCache::new(vec![
            entry("v04", &["v04.md"]),
            entry("blatt05", &["blatt05.md"]),
            entry("anh03", &["anh0301.md"]),
        ])
        .unwrap();
        assert_eq!(cache.group(ChapterGroup::Preface)[0].1, "v04.md");
        assert_eq!(cache.group(ChapterGroup::Main)[0].1, "blatt05.md");
        assert_eq!(cache.group(ChapterGroup::Appendix)[0].1, "anh0301.md");
    }

    #[test]
    fn test_invalid_file_names_are_rejected() {
        let result = FileCache::new(vec![entry("foo", &["foobar.md"])]);
        assert!(matches!(result, Err(Error::Structural { .. })));
    }

    #[test]
    fn test_neighbours() {
        let cache = FileCache::new(vec![
            entry("anh03", &["anh0301.md", "anh0302.md"]),
            entry("v04", &["v04.md"]),
            entry("blatt05", &["blatt05.md"]),
        ])
        .unwrap();

        let (prev, next) = cache.get_neighbours_for("blatt05/blatt05.md").unwrap();
        assert_eq!(prev, Some(&cached("v04", "v04.md")));
        assert_eq!(next, Some(&cached("anh03", "anh0301.md")));

        let (prev, next) = cache.get_neighbours_for("v04/v04.md").unwrap();
        assert_eq!(prev, None);
        assert_eq!(next, Some(&cached("blatt05", "blatt05.md")));

        let (prev, next) = cache.get_neighbours_for("anh03/anh0302.md").unwrap();
        assert_eq!(prev, Some(&cached("anh03", "anh0301.md")));
        assert_eq!(next, None);
    }

    #[test]
    fn test_unknown_file_has_no_neighbours() {
        let cache = FileCache::new(vec![entry("anh03", &["anh0301.md"])]).unwrap();
        assert!(matches!(
            cache.get_neighbours_for("fooo.md"),
            Err(Error::Structural { .. })
        ));
    }

    #[test]
    fn test_chapter_group_classification() {
        assert_eq!(ChapterGroup::of("k01"), Some(ChapterGroup::Main));
        assert_eq!(ChapterGroup::of("v01.md"), Some(ChapterGroup::Preface));
        assert_eq!(ChapterGroup::of("anh02"), Some(ChapterGroup::Appendix));
        assert_eq!(ChapterGroup::of("paper"), None);
        assert_eq!(ChapterGroup::of("bilder"), None);
    }
}
