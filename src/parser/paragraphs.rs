//! Splitting documents into numbered paragraphs.

use std::collections::BTreeMap;

/// Paragraphs of a document: the (1-based) line a paragraph starts on maps
/// to its lines, without line endings.
pub type Paragraphs = BTreeMap<usize, Vec<String>>;

/// Join lines ending on `\` with their successor.
///
/// For every joined line an empty line is inserted after the next blank line
/// so that the line numbers of the following paragraphs stay correct:
/// `["a", "b\\", "c", "", "d"]` becomes `["a", "b c", "", "", "d"]`.
pub fn joined_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut iter = lines.into_iter();
    let mut output = Vec::new();
    let mut pending_blank_lines = 0;
    while let Some(line) = iter.next() {
        let mut line = line.as_ref().to_string();
        let mut hit_blank_line = false;
        while line.trim_end().ends_with('\\') {
            let trimmed = line.trim_end();
            line = format!("{} ", &trimmed[..trimmed.len() - 1]);
            let Some(next) = iter.next() else {
                break;
            };
            pending_blank_lines += 1;
            if next.as_ref().trim().is_empty() {
                hit_blank_line = true;
                break;
            }
            line.push_str(next.as_ref());
        }
        let is_blank = line.trim().is_empty();
        output.push(line);
        if (hit_blank_line || is_blank) && pending_blank_lines > 0 {
            output.extend(std::iter::repeat(String::new()).take(pending_blank_lines));
            pending_blank_lines = 0;
        }
    }
    output
}

/// Split a document into paragraphs.
///
/// Blank lines separate paragraphs; runs of blank lines and a trailing blank
/// line do not produce empty paragraphs. If `join_lines` is set, lines ending
/// on `\` are joined first (see [`joined_lines`]).
pub fn file2paragraphs(text: &str, join_lines: bool) -> Paragraphs {
    let lines: Vec<String> = if join_lines {
        joined_lines(text.split('\n'))
    } else {
        text.split('\n').map(str::to_string).collect()
    };
    lines2paragraphs(lines)
}

/// Same as [`file2paragraphs`] for an already split document.
pub fn lines2paragraphs<I, S>(lines: I) -> Paragraphs
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut paragraphs = Paragraphs::new();
    let mut current = 1;
    paragraphs.insert(current, Vec::new());
    for (lnum, line) in lines.into_iter().enumerate() {
        let line = line.as_ref().trim_end();
        if line.is_empty() {
            if paragraphs.get(&current).is_some_and(Vec::is_empty) {
                paragraphs.remove(&current);
            }
            // paragraph starts on the next line; lines count from 1
            current = lnum + 2;
            paragraphs.insert(current, Vec::new());
        } else if let Some(paragraph) = paragraphs.get_mut(&current) {
            paragraph.push(line.to_string());
        }
    }
    if paragraphs.get(&current).is_some_and(Vec::is_empty) {
        paragraphs.remove(&current);
    }
    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_paragraph() {
        let pars = file2paragraphs("Hallo Welt", false);
        assert_eq!(pars.len(), 1);
        assert_eq!(pars[&1], vec!["Hallo Welt"]);
    }

    #[test]
    fn test_multiline_paragraph() {
        let pars = file2paragraphs("Hallo\nWelt", false);
        assert_eq!(pars[&1], vec!["Hallo", "Welt"]);
    }

    #[test]
    fn test_multiple_paragraphs() {
        let pars = file2paragraphs("Ich\nbin\n\nein\nTest", false);
        assert_eq!(pars[&1], vec!["Ich", "bin"]);
        assert_eq!(pars[&4], vec!["ein", "Test"]);
    }

    #[test]
    fn test_blank_runs_and_trailing_newline() {
        let pars = file2paragraphs("a\n\n\n\nb\n", false);
        assert_eq!(pars.keys().copied().collect::<Vec<_>>(), vec![1, 5]);
        let pars = file2paragraphs("\n\nfoo", false);
        assert_eq!(pars.keys().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_joined_lines_keep_line_numbers() {
        let pars = file2paragraphs("##bad\\\nexample\n\ndone", true);
        assert!(pars.contains_key(&4));
        assert!(!pars[&1].join("\n").contains('\\'));
        assert_eq!(pars[&1], vec!["##bad example"]);
    }

    #[test]
    fn test_joined_lines() {
        let joined = joined_lines(["a", "b\\", "c", "", "d"]);
        assert_eq!(joined, vec!["a", "b c", "", "", "d"]);
    }

    #[test]
    fn test_backslash_before_blank_line() {
        let joined = joined_lines(["a\\", "", "b"]);
        assert_eq!(joined, vec!["a ", "", "b"]);
    }

    #[test]
    fn test_trailing_whitespace_is_stripped() {
        let pars = file2paragraphs("foo   \r\nbar\t", false);
        assert_eq!(pars[&1], vec!["foo", "bar"]);
    }
}
