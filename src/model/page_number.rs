//! Page number markers (`|| - Seite 12 -`).

use super::roman::to_roman;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest page number taken from a document. Markers above it are treated
/// as unparsable.
pub const MAX_PAGE_NUMBER: u32 = 1_000_000;

/// Value of a page number: a single page or an inclusive range of pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageValue {
    /// A single page
    Single(u32),
    /// Pages `start` up to and including `stop`
    Range { start: u32, stop: u32 },
}

impl PageValue {
    /// First page covered.
    pub fn first(&self) -> u32 {
        match *self {
            PageValue::Single(n) => n,
            PageValue::Range { start, .. } => start,
        }
    }

    /// Last page covered.
    pub fn last(&self) -> u32 {
        match *self {
            PageValue::Single(n) => n,
            PageValue::Range { stop, .. } => stop,
        }
    }

    /// Check whether this is a range.
    pub fn is_range(&self) -> bool {
        matches!(self, PageValue::Range { .. })
    }

    /// Build a value starting at `start` spanning `diff` further pages.
    pub fn spanning(start: u32, diff: u32) -> Self {
        if diff == 0 {
            PageValue::Single(start)
        } else {
            PageValue::Range {
                start,
                stop: start.saturating_add(diff),
            }
        }
    }

    fn render(&self, arabic: bool) -> String {
        let fmt = |n: u32| {
            if arabic {
                n.to_string()
            } else {
                to_roman(n).unwrap_or_else(|_| n.to_string())
            }
        };
        match *self {
            PageValue::Single(n) => fmt(n),
            PageValue::Range { start, stop } => format!("{}-{}", fmt(start), fmt(stop)),
        }
    }
}

impl From<u32> for PageValue {
    fn from(n: u32) -> Self {
        PageValue::Single(n)
    }
}

/// A page number marker found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNumber {
    /// Word in front of the number, e.g. "Seite" or "Folie"
    pub identifier: String,

    /// Page or page range
    pub number: PageValue,

    /// Arabic or roman numbering
    pub arabic: bool,

    /// Line of the marker (1-based), 0 if unknown
    pub line_no: usize,
}

impl PageNumber {
    /// Create an arabic page number.
    pub fn new(identifier: impl Into<String>, number: impl Into<PageValue>) -> Self {
        Self {
            identifier: identifier.into(),
            number: number.into(),
            arabic: true,
            line_no: 0,
        }
    }

    /// Set whether the number is written in arabic digits.
    pub fn with_arabic(mut self, arabic: bool) -> Self {
        self.arabic = arabic;
        self
    }

    /// Set the line number.
    pub fn with_line(mut self, line_no: usize) -> Self {
        self.line_no = line_no;
        self
    }

    /// Render as MarkDown marker, e.g. `|| - Seite 12 -`.
    pub fn format(&self) -> String {
        format!(
            "|| - {} {} -",
            capitalize(&self.identifier),
            self.number.render(self.arabic)
        )
    }

    /// Number as displayed (arabic or roman) without identifier.
    pub fn display_number(&self) -> String {
        self.number.render(self.arabic)
    }

    /// Anchor of the page in converted documents, e.g. `p12`.
    pub fn anchor_id(&self) -> String {
        format!("p{}", self.display_number())
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_arabic() {
        assert_eq!(PageNumber::new("Seite", 12).format(), "|| - Seite 12 -");
        assert_eq!(PageNumber::new("seite", 12).format(), "|| - Seite 12 -");
    }

    #[test]
    fn test_format_roman_and_ranges() {
        let p = PageNumber::new("page", 12).with_arabic(false);
        assert_eq!(p.format(), "|| - Page XII -");
        let p = PageNumber::new("page", PageValue::Range { start: 100, stop: 103 });
        assert_eq!(p.format(), "|| - Page 100-103 -");
        let p = PageNumber::new("Folie", PageValue::Range { start: 2, stop: 3 }).with_arabic(false);
        assert_eq!(p.display_number(), "II-III");
        assert_eq!(p.anchor_id(), "pII-III");
        assert_eq!(PageNumber::new("Seite", 7).anchor_id(), "p7");
    }

    #[test]
    fn test_spanning() {
        assert_eq!(PageValue::spanning(4, 0), PageValue::Single(4));
        assert_eq!(
            PageValue::spanning(4, 2),
            PageValue::Range { start: 4, stop: 6 }
        );
        assert_eq!(PageValue::spanning(4, 2).last(), 6);
    }
}
