//! Locating LaTeX formulas in MarkDown.
//!
//! Display math is enclosed in `$$`, inline math in `$`. An escaped dollar
//! (`\$`) is literal text. Formulas are keyed by `(line, column)` of their
//! opening delimiter, both counting from 1.

use super::paragraphs::Paragraphs;
use std::collections::BTreeMap;

/// Formulas by `(line, column)`.
pub type Formulas = BTreeMap<(usize, usize), String>;

/// Column at which the text following `text_before` continues. `acc` is the
/// column `text_before` itself started at.
pub fn compute_position(text_before: &str, acc: usize) -> usize {
    match text_before.rfind('\n') {
        Some(idx) => text_before[idx + 1..].chars().count() + 1,
        None => text_before.chars().count() + acc,
    }
}

/// Replace a formula by spaces, keeping its line breaks.
fn blank_out(token: &str) -> String {
    token
        .chars()
        .map(|c| if c == '\n' { '\n' } else { ' ' })
        .collect()
}

/// Find formulas enclosed in `indicator` (usually `$$`).
///
/// If `stripped` is given, the document with all found formulas replaced by
/// spaces is appended to it; columns and lines of the remaining text are
/// unchanged.
pub fn parse_environments(
    document: &str,
    indicator: &str,
    start_line: usize,
    mut stripped: Option<&mut String>,
) -> Formulas {
    let document = document.replace("\\$", "  ");
    let delimiter_width = indicator.chars().count();
    let mut formulas = Formulas::new();
    let mut line_number = start_line;
    let mut last_plain = "";
    let mut pos_in_line = 1;
    let mut in_formula = false;
    for token in document.split(indicator) {
        if in_formula {
            let pos = compute_position(last_plain, pos_in_line);
            formulas.insert((line_number, pos), token.to_string());
            pos_in_line = compute_position(token, pos) + 2 * delimiter_width;
            if let Some(out) = stripped.as_deref_mut() {
                out.push_str(&" ".repeat(delimiter_width));
                out.push_str(&blank_out(token));
                out.push_str(&" ".repeat(delimiter_width));
            }
        } else {
            last_plain = token;
            if let Some(out) = stripped.as_deref_mut() {
                out.push_str(token);
            }
        }
        in_formula = !in_formula;
        line_number += token.matches('\n').count();
    }
    formulas
}

/// Find formulas enclosed in single dollars. Display math has to be removed
/// beforehand, see [`parse_environments`]. A dollar without a partner on the
/// same line starts no formula.
pub fn parse_single_dollar_formulas(document: &str, start_line: usize) -> Formulas {
    let mut formulas = Formulas::new();
    for (lnum, line) in document.split('\n').enumerate() {
        let lnum = lnum + start_line;
        let tokens: Vec<&str> = line.split('$').collect();
        if tokens.len() < 3 {
            continue;
        }
        let mut pos = 0;
        let mut in_formula = true;
        let mut last_added = None;
        for token in tokens {
            in_formula = !in_formula;
            if in_formula {
                let key = (lnum, pos + 1);
                formulas.insert(key, token.to_string());
                last_added = Some(key);
                pos += 2;
            }
            pos += token.chars().count();
        }
        // the last token was opened but never closed
        if in_formula {
            if let Some(key) = last_added {
                formulas.remove(&key);
            }
        }
    }
    formulas
}

/// Find all formulas in the given paragraphs.
pub fn parse_formulas(paragraphs: &Paragraphs) -> Formulas {
    let mut formulas = Formulas::new();
    for (&start, lines) in paragraphs {
        let text = lines.join("\n");
        let mut stripped = String::with_capacity(text.len());
        formulas.extend(parse_environments(&text, "$$", start, Some(&mut stripped)));
        formulas.extend(parse_single_dollar_formulas(&stripped, start));
    }
    formulas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::file2paragraphs;

    fn formulas(text: &str) -> Formulas {
        parse_formulas(&file2paragraphs(text, false))
    }

    #[test]
    fn test_display_math_positions() {
        let f = formulas("Here is $$\\tau$$ and $$\\pi$$.");
        assert_eq!(f[&(1, 9)], "\\tau");
        assert_eq!(f[&(1, 22)], "\\pi");
    }

    #[test]
    fn test_three_formulas_on_a_line() {
        let f = formulas("u\nok $$first$$, then $$second$$ and in the end $$third$$.");
        let keys: Vec<_> = f.keys().copied().collect();
        assert_eq!(keys, vec![(2, 4), (2, 20), (2, 46)]);
    }

    #[test]
    fn test_mixed_formulas() {
        let f = formulas("test $first$ and $$second$$ $third$");
        assert_eq!(f[&(1, 6)], "first");
        assert_eq!(f[&(1, 18)], "second");
        assert_eq!(f[&(1, 29)], "third");
    }

    #[test]
    fn test_formulas_across_lines() {
        let f = formulas("test \n$first$ an\nd $$second$$ $third$");
        assert_eq!(f[&(2, 1)], "first");
        assert_eq!(f[&(3, 3)], "second");
        assert_eq!(f[&(3, 14)], "third");
    }

    #[test]
    fn test_multiple_paragraphs() {
        let f = formulas("hi\n$foo$ and $bar$\n\n$$gamma$$ and $$beta$$");
        let keys: Vec<_> = f.keys().copied().collect();
        assert_eq!(keys, vec![(2, 1), (2, 11), (4, 1), (4, 15)]);
    }

    #[test]
    fn test_escaped_and_unclosed_dollars() {
        assert!(formulas("costs 5\\$ and 6\\$").is_empty());
        assert!(formulas("only $ one").is_empty());
        let f = formulas("$a$ and $b");
        assert_eq!(f.len(), 1);
        assert_eq!(f[&(1, 1)], "a");
    }

    #[test]
    fn test_multiline_display_math() {
        let f = formulas("$$a\n+b$$ and $c$");
        assert_eq!(f[&(1, 1)], "a\n+b");
        assert_eq!(f[&(2, 10)], "c");
    }
}
