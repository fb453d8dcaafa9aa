//! Extraction of page number markers.

use super::paragraphs::{file2paragraphs, Paragraphs};
use crate::config::page_number_pattern;
use crate::error::Result;
use crate::model::{roman, PageNumber, PageValue, MAX_PAGE_NUMBER};
use std::path::Path;

/// Parse a single number, arabic or roman. The flag tells which one it was.
/// Numbers above [`MAX_PAGE_NUMBER`] are rejected.
fn parse_number(text: &str) -> Option<(u32, bool)> {
    let parsed = match text.parse::<u32>() {
        Ok(n) => Some((n, true)),
        Err(_) => roman::from_roman(text).ok().map(|n| (n, false)),
    };
    parsed.filter(|&(n, _)| n <= MAX_PAGE_NUMBER)
}

/// Parse a page number or range like `12`, `XII` or `100-103`.
pub fn parse_page_value(text: &str) -> Option<(PageValue, bool)> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    match text.split_once('-') {
        Some((start, stop)) => {
            let (start, arabic) = parse_number(start)?;
            let (stop, _) = parse_number(stop)?;
            Some((PageValue::Range { start, stop }, arabic))
        }
        None => parse_number(&text).map(|(n, arabic)| (PageValue::Single(n), arabic)),
    }
}

/// Parse a page number marker line.
pub fn parse_page_number(line: &str) -> Option<PageNumber> {
    let caps = page_number_pattern().captures(line)?;
    let (value, arabic) = parse_page_value(&caps[2])?;
    Some(PageNumber::new(&caps[1], value).with_arabic(arabic))
}

/// Extract page numbers from paragraphs.
///
/// Page numbers have to form a paragraph of their own. Paragraphs starting
/// after `ignore_after` are skipped; `None` scans everything. Markers with an
/// unparsable number are ignored.
pub fn extract_page_numbers_from_par(
    paragraphs: &Paragraphs,
    ignore_after: Option<usize>,
) -> Vec<PageNumber> {
    paragraphs
        .iter()
        .take_while(|(&start, _)| ignore_after.map_or(true, |limit| start <= limit))
        .filter(|(_, lines)| lines.len() == 1 && lines[0].starts_with("||"))
        .filter_map(|(&start, lines)| parse_page_number(&lines[0]).map(|p| p.with_line(start)))
        .collect()
}

/// Read a file and extract its page numbers, see
/// [`extract_page_numbers_from_par`].
pub fn extract_page_numbers(
    path: impl AsRef<Path>,
    ignore_after: Option<usize>,
) -> Result<Vec<PageNumber>> {
    let text = std::fs::read_to_string(path)?;
    Ok(extract_page_numbers_from_par(
        &file2paragraphs(&text, false),
        ignore_after,
    ))
}
