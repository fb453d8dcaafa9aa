//! Building blocks of a check: what it needs, how important it is and what
//! it reports.

use crate::config::IMAGE_DIRECTORIES;
use crate::model::Heading;
use crate::parser::{Formulas, Paragraphs};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A raw page number marker: line number and the text after `||`.
pub type RawPageNumber = (usize, String);

/// Headings of all files within one directory.
pub type DirectoryHeadings = BTreeMap<PathBuf, Vec<Heading>>;

/// Page number markers of all files within one directory.
pub type DirectoryPageNumbers = BTreeMap<PathBuf, Vec<RawPageNumber>>;

/// The input a check asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MistakeType {
    /// The whole file as one string
    FullFile,
    /// A single line with its number
    Oneliner,
    /// The paragraphs of a file
    Paragraphs,
    /// All formulas of a file
    Formulas,
    /// All headings of a file
    Headings,
    /// All headings of a directory
    HeadingsDir,
    /// All page number markers of a file
    PageNumbers,
    /// All page number markers of a directory
    PageNumbersDir,
    /// The path of a configuration file
    Configuration,
}

impl MistakeType {
    /// Whether checks of this type run once per directory.
    pub fn is_directory_wide(&self) -> bool {
        matches!(self, MistakeType::HeadingsDir | MistakeType::PageNumbersDir)
    }
}

/// Severity of a mistake. Lower priorities are more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum MistakePriority {
    Critical,
    #[default]
    Normal,
    Pedantic,
}

impl std::str::FromStr for MistakePriority {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "critical" | "1" => Ok(MistakePriority::Critical),
            "normal" | "2" => Ok(MistakePriority::Normal),
            "pedantic" | "3" => Ok(MistakePriority::Pedantic),
            other => Err(crate::Error::Other(format!("unknown priority: {}", other))),
        }
    }
}

/// A mistake found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorMessage {
    /// German description of the mistake
    pub message: String,

    /// Line of the mistake, if it can be pinned down
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineno: Option<usize>,

    /// Position within the line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<usize>,

    /// File or directory the mistake was found in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl ErrorMessage {
    /// Create a message without location.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            lineno: None,
            pos: None,
            path: None,
        }
    }

    /// Create a message for a line.
    pub fn at_line(message: impl Into<String>, lineno: usize) -> Self {
        Self::new(message).with_line(lineno)
    }

    /// Set the line number.
    pub fn with_line(mut self, lineno: usize) -> Self {
        self.lineno = Some(lineno);
        self
    }

    /// Set the position within the line.
    pub fn with_pos(mut self, pos: usize) -> Self {
        self.pos = Some(pos);
        self
    }

    /// Set the path, unless already set.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        if self.path.is_none() {
            self.path = Some(path.into());
        }
        self
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lineno {
            Some(line) => write!(f, "Zeile {}: {}", line, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Data handed to a check, matching its [`MistakeType`].
#[derive(Debug, Clone, Copy)]
pub enum MistakeInput<'a> {
    FullFile(&'a str),
    Line(usize, &'a str),
    Paragraphs(&'a Paragraphs),
    Formulas(&'a Formulas),
    Headings(&'a [Heading]),
    HeadingsDir(&'a DirectoryHeadings),
    PageNumbers(&'a [RawPageNumber]),
    PageNumbersDir(&'a DirectoryPageNumbers),
    Configuration(&'a Path),
}

/// A single check run by [`super::Mistkerl`].
///
/// Checks get the input announced by [`Mistake::mistake_type`] and report
/// the first mistake they find. Inputs of another kind are ignored.
pub trait Mistake: Send + Sync {
    /// Name of the check.
    fn name(&self) -> &'static str;

    /// The input this check needs.
    fn mistake_type(&self) -> MistakeType;

    /// Severity of the reported mistakes.
    fn priority(&self) -> MistakePriority {
        MistakePriority::Normal
    }

    /// File extensions this check applies to.
    fn file_types(&self) -> &'static [&'static str] {
        &["md"]
    }

    /// Whether the check applies to the given file.
    fn applies_to(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.file_types().iter().any(|t| t.eq_ignore_ascii_case(ext)))
    }

    /// Run the check.
    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage>;
}

/// Whether a file holds image descriptions, e.g. `k01/bilder.md`.
pub fn is_image_file(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| {
            let stem = stem.to_lowercase();
            IMAGE_DIRECTORIES.iter().any(|d| stem.contains(d))
        })
}

/// Extract `||` page number markers from a document.
pub fn raw_page_numbers(text: &str) -> Vec<RawPageNumber> {
    text.split('\n')
        .enumerate()
        .filter_map(|(idx, line)| line.strip_prefix("||").map(|rest| (idx + 1, rest.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_display() {
        assert_eq!(ErrorMessage::at_line("kaputt", 3).to_string(), "Zeile 3: kaputt");
        assert_eq!(ErrorMessage::new("kaputt").to_string(), "kaputt");
    }

    #[test]
    fn test_with_path_keeps_existing() {
        let msg = ErrorMessage::new("x").with_path("a.md").with_path("b.md");
        assert_eq!(msg.path, Some(PathBuf::from("a.md")));
    }

    #[test]
    fn test_priority_order() {
        assert!(MistakePriority::Critical < MistakePriority::Normal);
        assert!(MistakePriority::Normal < MistakePriority::Pedantic);
        assert_eq!("pedantic".parse::<MistakePriority>().unwrap(), MistakePriority::Pedantic);
        assert!("bogus".parse::<MistakePriority>().is_err());
    }

    #[test]
    fn test_image_files() {
        assert!(is_image_file(Path::new("k01/bilder.md")));
        assert!(is_image_file(Path::new("k01/images.md")));
        assert!(!is_image_file(Path::new("k01/k01.md")));
    }

    #[test]
    fn test_raw_page_numbers() {
        let pnums = raw_page_numbers("foo\n|| - Seite 1 -\n\n||- page 2-");
        assert_eq!(pnums, vec![(2, " - Seite 1 -".into()), (4, "- page 2-".into())]);
    }
}
