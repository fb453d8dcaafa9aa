//! Data types shared by the parser, the checkers and the converters.
//!
//! Lectures consist of chapter files (`k01/k01.md`, `anh01/anh01.md`, ...).
//! This module models what is extracted from them: headings with their
//! anchors, page number markers and the ordered set of chapter files.

mod file_cache;
mod heading;
mod page_number;
pub mod roman;

pub use file_cache::{CachedFile, ChapterGroup, FileCache};
pub use heading::{extract_chapter_number, gen_id, Heading, HeadingType};
pub use page_number::{PageNumber, PageValue, MAX_PAGE_NUMBER};
