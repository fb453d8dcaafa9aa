//! MarkDown parsing tailored to lecture documents.
//!
//! This is not a full MarkDown parser. It extracts exactly what the checkers
//! and converters need: paragraphs with line numbers, headings, page numbers,
//! formulas and links. Code can be blanked out beforehand so that its content
//! is not mistaken for any of these.

mod codeblocks;
mod formulas;
mod headings;
mod links;
mod page_numbers;
mod paragraphs;

pub use codeblocks::rm_codeblocks;
pub use formulas::{
    compute_position, parse_environments, parse_formulas, parse_single_dollar_formulas, Formulas,
};
pub use headings::{
    extract_headings, extract_headings_from_par, is_hashed_heading, parse_hashed_heading,
};
pub use links::{find_links_in_markdown, get_html_elements_ids_from_document, Link, LinkKind};
pub use page_numbers::{
    extract_page_numbers, extract_page_numbers_from_par, parse_page_number, parse_page_value,
};
pub use paragraphs::{file2paragraphs, joined_lines, lines2paragraphs, Paragraphs};
