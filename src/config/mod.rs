//! Lecture configuration, naming conventions and localisation.
//!
//! Every lecture keeps its metadata in a `.lecture_meta_data.dcxml` file in
//! its root directory. Sub directories may carry their own file to override
//! values locally.

mod l10n;
mod meta;

pub use l10n::Translate;
pub use meta::{
    get_lnum_of_tag, get_semester, read_stored_values, semester_for, ConfFactory, LectureMetaData,
    MetaInfo,
};

use regex::Regex;
use std::sync::OnceLock;

/// File name of the per-lecture configuration.
pub const CONF_FILE_NAME: &str = ".lecture_meta_data.dcxml";

/// Prefixes of preface directories and files.
pub const PREFACE_PREFIXES: &[&str] = &["v"];

/// Prefixes of main chapter directories and files.
pub const MAIN_PREFIXES: &[&str] = &[
    "k", "blatt", "paper", "uebung", "ueb", "lecture", "chap", "kap", "exer",
];

/// Prefixes of appendix directories and files.
pub const APPENDIX_PREFIXES: &[&str] = &["anh", "app"];

/// Words which may introduce a page number (matched case-insensitively).
pub const PAGE_NUMBERING_TOKENS: &[&str] = &["seite", "folie", "slide", "page", "blatt", "sheet"];

/// Directory names holding images and image descriptions.
pub const IMAGE_DIRECTORIES: &[&str] = &["bilder", "images"];

/// Lines a chapter file may have before Mistkerl suggests splitting it.
pub const MAX_FILE_LINES: usize = 2500;

/// All chapter prefixes.
pub fn valid_prefixes() -> impl Iterator<Item = &'static str> {
    PREFACE_PREFIXES
        .iter()
        .chain(MAIN_PREFIXES)
        .chain(APPENDIX_PREFIXES)
        .copied()
}

/// Pattern of a page number marker. Group 1 is the identifier, group 2 the
/// number or range, e.g. `|| - Seite 12 -` or `|| - Folie II-IV -`.
pub fn page_number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let tokens = PAGE_NUMBERING_TOKENS.join("|");
        Regex::new(&format!(
            r"(?i)^\|\|\s*-\s*({})\s+(\w+(?:\s*-\s*\w+)?)\s*-",
            tokens
        ))
        .unwrap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_pattern() {
        let re = page_number_pattern();
        let caps = re.captures("|| - Seite 80 -").unwrap();
        assert_eq!(&caps[1], "Seite");
        assert_eq!(&caps[2], "80");

        let caps = re.captures("||  - Folie 100-103 -").unwrap();
        assert_eq!(&caps[2], "100-103");

        let caps = re.captures("||  - Seite 80-").unwrap();
        assert_eq!(&caps[2], "80");

        assert!(re.captures("|| - alles fehlerhaft hier -").is_none());
    }

    #[test]
    fn test_valid_prefixes_cover_all_groups() {
        let prefixes: Vec<_> = valid_prefixes().collect();
        assert!(prefixes.contains(&"v"));
        assert!(prefixes.contains(&"k"));
        assert!(prefixes.contains(&"anh"));
    }
}
