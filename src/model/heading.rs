//! Headings and the anchors pandoc derives from them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Section of the lecture a heading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingType {
    /// Regular chapter
    #[default]
    Normal,
    /// Preface, directories starting with `v`
    Preface,
    /// Appendix, directories starting with `anh`
    Appendix,
}

/// A heading of a MarkDown document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    /// Heading text, continuation lines are joined with `\n`
    pub text: String,

    /// Level from 1 to 6
    pub level: u8,

    /// Line on which the heading starts (1-based)
    pub line_number: usize,

    /// Chapter number as derived from the file name
    pub chapter_number: Option<u32>,

    /// Preface, main part or appendix
    pub kind: HeadingType,
}

impl Heading {
    /// Create a new heading.
    pub fn new(text: impl Into<String>, level: u8) -> Self {
        Self {
            text: text.into(),
            level: level.clamp(1, 6),
            line_number: 0,
            chapter_number: None,
            kind: HeadingType::Normal,
        }
    }

    /// Set the line number.
    pub fn with_line_number(mut self, line_number: usize) -> Self {
        self.line_number = line_number;
        self
    }

    /// Set the chapter number.
    pub fn with_chapter_number(mut self, chapter: u32) -> Self {
        self.chapter_number = Some(chapter);
        self
    }

    /// Set the heading type.
    pub fn with_kind(mut self, kind: HeadingType) -> Self {
        self.kind = kind;
        self
    }

    /// Anchor id of this heading in the generated HTML.
    pub fn id(&self) -> String {
        gen_id(&self.text)
    }
}

/// Generate the anchor id pandoc assigns to a heading.
///
/// The text is lower-cased, spaces become hyphens and everything except
/// alphanumerics, `-`, `_` and `.` is dropped. A dropped character between two
/// spaces swallows one of them. Everything up to the first letter is removed.
pub fn gen_id(text: &str) -> String {
    let chars: Vec<char> = text.nfc().flat_map(char::to_lowercase).collect();
    let mut id = String::with_capacity(chars.len());
    let mut skip_space = false;
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            if skip_space {
                skip_space = false;
            } else {
                id.push('-');
            }
        } else if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
            skip_space = false;
            id.push(c);
        } else {
            let space_before = i > 0 && chars[i - 1] == ' ';
            let space_after = chars.get(i + 1) == Some(&' ');
            if space_before && space_after {
                skip_space = true;
            }
        }
    }
    match id.find(char::is_alphabetic) {
        Some(start) => id[start..].to_string(),
        None => String::new(),
    }
}

/// Extract the main chapter number from a file name like `k0501.md`.
///
/// Leading letters are stripped; the rest must be an even number of digits,
/// of which the first two are the chapter number.
pub fn extract_chapter_number(path: impl AsRef<Path>) -> Result<u32> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".md").unwrap_or(&name);
    let digits = stem.trim_start_matches(|c: char| c.is_alphabetic());
    if digits.is_empty()
        || digits.len() % 2 != 0
        || !digits.chars().all(|c| c.is_ascii_digit())
    {
        return Err(Error::structural(
            "the file does not follow naming conventions",
            path,
        ));
    }
    digits[..2]
        .parse()
        .map_err(|_| Error::structural("invalid chapter number", path))
}
