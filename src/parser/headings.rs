//! Heading recognition for hashed (`## Title`) and underlined headings.

use super::paragraphs::Paragraphs;
use crate::error::Result;
use crate::model::{extract_chapter_number, Heading};
use std::path::Path;

/// Check whether a line starts a hashed heading (`#` to `######`, followed by
/// a word). `#.` is not a heading.
pub fn is_hashed_heading(line: &str) -> bool {
    let rest = line.trim_start_matches('#');
    let level = line.len() - rest.len();
    (1..=6).contains(&level)
        && !rest.starts_with('.')
        && rest
            .trim_start()
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Split a hashed heading into its text and level.
pub fn parse_hashed_heading(line: &str) -> (String, u8) {
    let rest = line.trim_start_matches('#');
    let level = (line.len() - rest.len()).min(6) as u8;
    (rest.trim_end_matches('#').trim().to_string(), level)
}

fn underline_level(line: &str) -> Option<u8> {
    let line = line.trim_end();
    if line.is_empty() {
        return None;
    }
    if line.chars().all(|c| c == '=') {
        Some(1)
    } else if line.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

fn continued(line: &str) -> Option<&str> {
    line.trim_end().strip_suffix('\\').map(str::trim_end)
}

/// Hashed headings at the start of a paragraph. Consecutive heading lines are
/// all reported; the first other line ends the search.
fn extract_hashed(start: usize, lines: &[String]) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut idx = 0;
    while idx < lines.len() && is_hashed_heading(&lines[idx]) {
        let line_number = start + idx;
        let mut text = String::new();
        let mut current = lines[idx].as_str();
        loop {
            match continued(current) {
                Some(part) => {
                    text.push_str(part);
                    idx += 1;
                    match lines.get(idx) {
                        Some(next) => {
                            text.push('\n');
                            current = next;
                        }
                        None => break,
                    }
                }
                None => {
                    text.push_str(current);
                    idx += 1;
                    break;
                }
            }
        }
        let (text, level) = parse_hashed_heading(&text);
        headings.push(Heading::new(text, level).with_line_number(line_number));
    }
    headings
}

/// An underlined heading: text lines (joined by trailing `\`) followed by a
/// line of `=` (level 1) or `-` (level 2).
fn extract_underlined(start: usize, lines: &[String]) -> Option<Heading> {
    let mut text = String::new();
    let mut idx = 0;
    while let Some(part) = lines.get(idx).and_then(|l| continued(l)) {
        text.push_str(part);
        text.push('\n');
        idx += 1;
    }
    text.push_str(lines.get(idx)?.trim());
    let level = underline_level(lines.get(idx + 1)?)?;
    Some(Heading::new(text.trim().to_string(), level).with_line_number(start))
}

/// Extract all headings from the given paragraphs.
///
/// With `max_headings` set, extraction stops after the paragraph which reached
/// the limit.
pub fn extract_headings_from_par(
    paragraphs: &Paragraphs,
    max_headings: Option<usize>,
) -> Vec<Heading> {
    let mut headings = Vec::new();
    for (&start, lines) in paragraphs {
        if max_headings.is_some_and(|max| headings.len() >= max) {
            break;
        }
        let Some(first) = lines.first() else {
            continue;
        };
        if is_hashed_heading(first) {
            headings.extend(extract_hashed(start, lines));
        } else if let Some(heading) = extract_underlined(start, lines) {
            headings.push(heading);
        }
    }
    if let Some(max) = max_headings {
        headings.truncate(max);
    }
    headings
}

/// Extract headings of a chapter file and attach the chapter number derived
/// from its file name.
pub fn extract_headings(path: impl AsRef<Path>, paragraphs: &Paragraphs) -> Result<Vec<Heading>> {
    let chapter = extract_chapter_number(path)?;
    Ok(extract_headings_from_par(paragraphs, None)
        .into_iter()
        .map(|h| h.with_chapter_number(chapter))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::file2paragraphs;

    fn headings(text: &str) -> Vec<Heading> {
        extract_headings_from_par(&file2paragraphs(text, false), None)
    }

    #[test]
    fn test_hashed_headings() {
        let h = headings("# Kapitel 1\n\nText\n\n## Abschnitt ##\n");
        assert_eq!(h.len(), 2);
        assert_eq!((h[0].text.as_str(), h[0].level, h[0].line_number), ("Kapitel 1", 1, 1));
        assert_eq!((h[1].text.as_str(), h[1].level, h[1].line_number), ("Abschnitt", 2, 5));
    }

    #[test]
    fn test_not_a_heading() {
        assert!(!is_hashed_heading("#. no heading"));
        assert!(!is_hashed_heading("####### seven"));
        assert!(!is_hashed_heading("#"));
        assert!(is_hashed_heading("###Test"));
        assert!(headings("#. nope\n\nfoo").is_empty());
    }

    #[test]
    fn test_underlined_headings() {
        let h = headings("Kapitel\n=======\n\nUnter\n-----\n");
        assert_eq!(h.len(), 2);
        assert_eq!((h[0].level, h[0].line_number), (1, 1));
        assert_eq!((h[1].text.as_str(), h[1].level), ("Unter", 2));
    }

    #[test]
    fn test_dashes_with_spaces_are_no_underline() {
        assert!(headings("text\n- - -\n").is_empty());
    }

    #[test]
    fn test_continued_hashed_heading() {
        let h = headings("# first\\\nsecond\n\nrest");
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].text, "first\nsecond");
    }

    #[test]
    fn test_continued_underlined_heading() {
        let h = headings("first\\\nsecond\n======");
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].text, "first\nsecond");
        assert_eq!(h[0].level, 1);
    }

    #[test]
    fn test_multiple_hashed_headings_in_one_paragraph() {
        let h = headings("# one\n## two\ntext\n### three");
        assert_eq!(h.len(), 2);
        assert_eq!(h[1].line_number, 2);
    }

    #[test]
    fn test_max_headings() {
        let h = extract_headings_from_par(&file2paragraphs("jo\n====\n\n##test", false), Some(1));
        assert_eq!(h.len(), 1);
        assert_eq!(h[0].text, "jo");
    }

    #[test]
    fn test_chapter_number_is_attached() {
        let pars = file2paragraphs("# Intro\n", false);
        let h = extract_headings("k03/k0301.md", &pars).unwrap();
        assert_eq!(h[0].chapter_number, Some(3));
        assert!(extract_headings("intro.md", &pars).is_err());
    }
}
