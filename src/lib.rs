//! # matuc
//!
//! Tools for editing lecture material in accessible MarkDown.
//!
//! Lectures consist of chapter directories (`k01`, `v01`, `anh01`, ...) with
//! MarkDown files, configured by a `.lecture_meta_data.dcxml` file in the
//! lecture root. This library converts them to accessible HTML with Pandoc,
//! generates tables of contents and page navigation and checks the sources
//! for common editing mistakes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use matuc::{Mistkerl, MistakeReport};
//!
//! fn main() -> matuc::Result<()> {
//!     let mistakes = Mistkerl::new().run("lecture")?;
//!     println!("{}", MistakeReport::new(mistakes).format_text(false));
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Conversion**: HTML through Pandoc, formulas with GladTeX or MathJax
//! - **Navigation**: tables of contents, chapter and page navigation bars
//! - **Quality assurance**: the Mistkerl with its checks and a link checker
//! - **Page numbers**: generating and fixing page number markers
//! - **Parallel processing**: uses Rayon for checking directories

pub mod config;
pub mod convert;
pub mod error;
pub mod filesystem;
pub mod imgdsc;
pub mod model;
pub mod pagenumbering;
pub mod parser;
pub mod qa;
pub mod render;
pub mod toc;

// Re-export commonly used types
pub use config::{ConfFactory, LectureMetaData, MetaInfo, Translate, CONF_FILE_NAME};
pub use convert::{ConversionProfile, ConvertOptions, ConverterRegistry, Master, OutputGenerator, Pandoc};
pub use error::{Error, Result};
pub use filesystem::{get_lecture_root, is_within_lecture, FileWalker, InitLecture};
pub use imgdsc::{DescriptionSnippets, ImageDescription};
pub use model::{FileCache, Heading, HeadingType, PageNumber, PageValue};
pub use qa::{ErrorMessage, Mistake, MistakePriority, Mistkerl};
pub use render::{JsonFormat, MistakeReport, Response, NO_MISTAKES};
pub use toc::{HeadingIndexer, TocFormatter};

use std::path::Path;

/// Generate the table of contents for the lecture at `path`. Returns an
/// empty string if the lecture has no headings or disables the table of
/// contents.
pub fn table_of_contents(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut indexer = HeadingIndexer::new(path)?;
    indexer.walk()?;
    if indexer.is_empty() {
        return Ok(String::new());
    }
    Ok(TocFormatter::new(indexer.get_index(), path)?.format())
}

/// Check a lecture file or directory for mistakes.
pub fn check(path: impl AsRef<Path>) -> Result<MistakeReport> {
    Ok(MistakeReport::new(Mistkerl::new().run(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_table_of_contents_of_new_lecture() {
        let dir = TempDir::new().unwrap();
        InitLecture::new(dir.path(), 2, "de").generate_structure().unwrap();
        let toc = table_of_contents(dir.path()).unwrap();
        assert!(toc.contains("Kapitel 1"));
        assert!(toc.contains("k02/k02.html"));
    }

    #[test]
    fn test_table_of_contents_missing_directory() {
        let dir = TempDir::new().unwrap();
        assert!(table_of_contents(dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_check_finds_mistakes() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("k01")).unwrap();
        fs::write(dir.path().join("k01").join("k01.md"), "# Titel\n\n<b>fett</b>\n").unwrap();
        let report = check(dir.path()).unwrap();
        assert!(!report.is_empty());
    }
}
