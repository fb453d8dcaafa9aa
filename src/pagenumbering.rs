//! Page number generation and consistency checks.
//!
//! Page numbers may be arabic or roman and may span ranges. A new page number
//! continues the numbering of its predecessor, keeping identifier and style.

use crate::config::{ConfFactory, MetaInfo, Translate};
use crate::error::{Error, Result};
use crate::model::{PageNumber, PageValue};
use crate::parser::{extract_page_numbers_from_par, file2paragraphs};
use std::fs;
use std::path::Path;

/// Generate the page number for `line` of `text`: the successor of the last
/// page number at or before this line. Without predecessor, page 1 with the
/// word "page" in the given language is returned.
pub fn add_page_number_from_str(text: &str, line: usize, language: &str) -> PageNumber {
    let paragraphs = file2paragraphs(text, false);
    match extract_page_numbers_from_par(&paragraphs, Some(line)).last() {
        Some(last) => {
            let next = last.number.last().saturating_add(1);
            PageNumber::new(last.identifier.clone(), next).with_arabic(last.arabic)
        }
        None => PageNumber::new(Translate::new(language).get("page"), 1),
    }
}

/// Same as [`add_page_number_from_str`], reading the document from `path`.
/// The language is taken from the lecture configuration.
pub fn add_page_number(path: impl AsRef<Path>, line: usize) -> Result<PageNumber> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let conf = ConfFactory::new().get_conf_instance(path)?;
    Ok(add_page_number_from_str(
        &text,
        line,
        conf.get(MetaInfo::Language),
    ))
}

/// Check that page numbers increase by one.
///
/// Returns the indices of wrong page numbers together with their expected
/// value. The numbering restarts on each change between arabic and roman
/// numbers; decreasing ranges are always reported.
pub fn check_page_numbering(pnums: &[PageNumber]) -> Vec<(usize, PageValue)> {
    let mut erroneous: Vec<(usize, PageValue)> = Vec::new();
    let Some(first) = pnums.first() else {
        return erroneous;
    };

    if let PageValue::Range { start, stop } = first.number {
        if start >= stop {
            erroneous.push((0, PageValue::spanning(stop, start - stop)));
        }
    }

    for (idx, pair) in pnums.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        let cur_idx = idx + 1;
        let different_style = prev.arabic != cur.arabic;

        let reference = if different_style {
            cur.number
        } else {
            match erroneous.last() {
                Some(&(reported, expected)) if reported == idx => expected,
                _ => prev.number,
            }
        };
        let expected = reference.last().saturating_add(u32::from(!different_style));

        let (cur_start, cur_diff, reversed) = match cur.number {
            PageValue::Single(n) => (n, 0, false),
            PageValue::Range { start, stop } if stop < start => (start, start - stop, true),
            PageValue::Range { start, stop } => (start, stop - start, false),
        };
        if !reversed && (different_style || cur_start == expected) {
            continue;
        }
        erroneous.push((cur_idx, PageValue::spanning(expected, cur_diff)));
    }
    erroneous
}

/// Compute corrected page numbers for a document as `(line, marker)` pairs.
pub fn fix_page_numbers(text: &str) -> Vec<(usize, String)> {
    let mut pnums = extract_page_numbers_from_par(&file2paragraphs(text, false), None);
    check_page_numbering(&pnums)
        .into_iter()
        .map(|(idx, expected)| {
            let pnum = &mut pnums[idx];
            pnum.number = expected;
            (pnum.line_no, pnum.format())
        })
        .collect()
}

/// Replace the given lines (1-based) of a document.
pub fn apply_corrections(text: &str, corrections: &[(usize, String)]) -> String {
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    for (line, replacement) in corrections {
        if let Some(target) = line.checked_sub(1).and_then(|i| lines.get_mut(i)) {
            *target = replacement.clone();
        }
    }
    lines.join("\n")
}

/// Fix the page numbering of a file in place and return the corrections.
pub fn fix_page_numbers_in_file(path: impl AsRef<Path>) -> Result<Vec<(usize, String)>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let corrections = fix_page_numbers(&text);
    if !corrections.is_empty() {
        log::debug!("fixing {} page numbers in {}", corrections.len(), path.display());
        fs::write(path, apply_corrections(&text, &corrections))?;
    }
    Ok(corrections)
}

/// Insert `text` before the given line (1-based) so that it forms a paragraph
/// of its own, adding blank lines where necessary. Line numbers beyond the
/// document append to it.
pub fn insert_line(lines: &mut Vec<String>, line: usize, text: &str) -> Result<()> {
    if line < 1 {
        return Err(Error::Other("line numbers count from one".into()));
    }
    let mut idx = (line - 1).min(lines.len());
    if idx > 0 && !lines[idx - 1].trim().is_empty() {
        lines.insert(idx, String::new());
        idx += 1;
    }
    lines.insert(idx, text.to_string());
    if lines.get(idx + 1).is_some_and(|next| !next.trim().is_empty()) {
        lines.insert(idx + 1, String::new());
    }
    Ok(())
}
