//! Link extraction.
//!
//! Recognised are inline links (`[text](target)`), labeled links
//! (`[text][label]`, `[text][]` and bare `[text]`), references
//! (`[label]: target`) and footnotes (`[^label]: content`). Each may be an
//! image when prefixed with `!`. Links within formulas are ignored and links
//! may nest, e.g. an image inside a link.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// Kind of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// `[text](target)`
    Inline,
    /// `[text][label]`, `[text][]` or `[text]`
    Labeled,
    /// `[label]: target`
    Reference,
    /// `[^label]: content`
    ReferenceFootnote,
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LinkKind::Inline => "inline",
            LinkKind::Labeled => "labeled",
            LinkKind::Reference => "reference",
            LinkKind::ReferenceFootnote => "reference_footnote",
        })
    }
}

/// A link found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Line of the opening bracket (1-based)
    pub line: usize,

    /// Kind of the link
    pub kind: LinkKind,

    /// Whether the link is prefixed by `!`
    pub is_image: bool,

    /// Text within the brackets
    pub text: String,

    /// Target for inline links and references, the label for labeled links
    /// and the content for footnotes
    pub target: String,
}

impl Link {
    pub fn new(
        line: usize,
        kind: LinkKind,
        is_image: bool,
        text: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            line,
            kind,
            is_image,
            text: text.into(),
            target: target.into(),
        }
    }
}

struct LinkScanner {
    /// Document with formulas replaced by spaces
    chars: Vec<char>,
    /// Original document
    source: Vec<char>,
    newlines: Vec<usize>,
    links: Vec<Link>,
}

impl LinkScanner {
    fn new(text: &str) -> Self {
        let source: Vec<char> = text.chars().collect();
        let chars = blank_formulas(&source);
        let newlines = source
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == '\n')
            .map(|(i, _)| i)
            .collect();
        Self {
            chars,
            source,
            newlines,
            links: Vec::new(),
        }
    }

    fn line_of(&self, idx: usize) -> usize {
        self.newlines.partition_point(|&nl| nl < idx) + 1
    }

    fn text(&self, start: usize, end: usize) -> String {
        self.source[start..end].iter().collect()
    }

    fn is_escaped(&self, idx: usize) -> bool {
        is_escaped(&self.chars, idx)
    }

    /// Index of the bracket closing the one at `open`, honouring nesting and
    /// escapes.
    fn matching(&self, open: usize, end: usize) -> Option<usize> {
        let (open_char, close_char) = match self.chars[open] {
            '[' => ('[', ']'),
            '(' => ('(', ')'),
            _ => return None,
        };
        let mut depth = 0;
        for idx in open..end {
            let c = self.chars[idx];
            if (c == open_char || c == close_char) && self.is_escaped(idx) {
                continue;
            }
            if c == open_char {
                depth += 1;
            } else if c == close_char {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
        }
        None
    }

    fn skip_blanks(&self, mut idx: usize, end: usize) -> usize {
        while idx < end && matches!(self.chars[idx], ' ' | '\t') {
            idx += 1;
        }
        idx
    }

    fn scan(&mut self, start: usize, end: usize) {
        let mut idx = start;
        while idx < end {
            if self.chars[idx] != '[' || self.is_escaped(idx) {
                idx += 1;
                continue;
            }
            let Some(close) = self.matching(idx, end) else {
                idx += 1;
                continue;
            };
            idx = self.scan_link(idx, close, end);
        }
    }

    /// Record the link with brackets at `open` and `close`; returns the index
    /// after the whole construct.
    fn scan_link(&mut self, open: usize, close: usize, end: usize) -> usize {
        let is_image = open > 0 && self.chars[open - 1] == '!' && !self.is_escaped(open - 1);
        let line = self.line_of(open);
        let text = self.text(open + 1, close);
        let after = close + 1;
        match self.chars.get(after).copied().filter(|_| after < end) {
            Some('(') => {
                if let Some(paren) = self.matching(after, end) {
                    let target = first_token(&self.text(after + 1, paren));
                    self.links
                        .push(Link::new(line, LinkKind::Inline, is_image, text, target));
                    self.scan(open + 1, close);
                    return paren + 1;
                }
            }
            Some('[') => {
                if let Some(label_end) = self.matching(after, end) {
                    let label = self.text(after + 1, label_end);
                    self.links
                        .push(Link::new(line, LinkKind::Labeled, is_image, text, label));
                    self.scan(open + 1, close);
                    return label_end + 1;
                }
            }
            Some(':') if text.starts_with('^') => {
                let content_start = self.skip_blanks(after + 1, end);
                let content_end = self.paragraph_end(content_start, end);
                let content = self.text(content_start, content_end);
                self.links.push(Link::new(
                    line,
                    LinkKind::ReferenceFootnote,
                    is_image,
                    text,
                    content,
                ));
                self.scan(content_start, content_end);
                return content_end;
            }
            Some(':') => {
                let target_start = self.skip_blanks(after + 1, end);
                let mut target_end = target_start;
                while target_end < end && !self.chars[target_end].is_whitespace() {
                    target_end += 1;
                }
                let target = first_token(&self.text(target_start, target_end));
                self.links
                    .push(Link::new(line, LinkKind::Reference, is_image, text, target));
                return target_end;
            }
            _ => {}
        }
        self.links.push(Link::new(
            line,
            LinkKind::Labeled,
            is_image,
            text,
            String::new(),
        ));
        self.scan(open + 1, close);
        close + 1
    }

    /// End of the paragraph containing `start`, i.e. the next blank line.
    fn paragraph_end(&self, start: usize, end: usize) -> usize {
        let mut idx = start;
        while idx < end {
            if self.chars[idx] == '\n' {
                let mut next = idx + 1;
                while next < end && matches!(self.chars[next], ' ' | '\t') {
                    next += 1;
                }
                if next >= end || self.chars[next] == '\n' {
                    return idx + 1;
                }
            }
            idx += 1;
        }
        end
    }
}

fn is_escaped(chars: &[char], idx: usize) -> bool {
    let backslashes = chars[..idx].iter().rev().take_while(|c| **c == '\\').count();
    backslashes % 2 == 1
}

/// Replace formulas by spaces, keeping line breaks and character positions.
fn blank_formulas(source: &[char]) -> Vec<char> {
    let mut chars = source.to_vec();
    let len = chars.len();
    let mut idx = 0;
    while idx < len {
        if source[idx] != '$' || is_escaped(source, idx) {
            idx += 1;
            continue;
        }
        let display = source.get(idx + 1) == Some(&'$');
        let body = if display { idx + 2 } else { idx + 1 };
        let closing = find_closing_dollar(source, body, display);
        match closing {
            Some(close) => {
                let stop = if display { close + 2 } else { close + 1 };
                for c in &mut chars[idx..stop] {
                    if *c != '\n' {
                        *c = ' ';
                    }
                }
                idx = stop;
            }
            None => idx = body,
        }
    }
    chars
}

fn find_closing_dollar(source: &[char], from: usize, display: bool) -> Option<usize> {
    let mut idx = from;
    while idx < source.len() {
        match source[idx] {
            '\n' if !display => return None,
            '$' if !is_escaped(source, idx) => {
                if !display {
                    return Some(idx);
                }
                if source.get(idx + 1) == Some(&'$') {
                    return Some(idx);
                }
            }
            _ => {}
        }
        idx += 1;
    }
    None
}

/// First whitespace separated token with surrounding `<>` removed.
fn first_token(text: &str) -> String {
    let token = text.split_whitespace().next().unwrap_or("");
    let token = token.strip_prefix('<').unwrap_or(token);
    token.strip_suffix('>').unwrap_or(token).to_string()
}

/// Find all links in a MarkDown document, in document order. A link is
/// reported before the links nested in its text.
pub fn find_links_in_markdown(text: &str) -> Vec<Link> {
    let mut scanner = LinkScanner::new(text);
    let end = scanner.chars.len();
    scanner.scan(0, end);
    scanner.links
}

fn html_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<(?:div|span)\b[^>]*?\bid\s*=\s*["']([^"']*)["']"#).unwrap()
    })
}

/// Collect the ids of `<div>` and `<span>` elements, which may serve as link
/// anchors. Empty ids are ignored.
pub fn get_html_elements_ids_from_document(text: &str) -> BTreeSet<String> {
    html_id_pattern()
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(text: &str) -> Vec<(usize, LinkKind, bool, String, String)> {
        find_links_in_markdown(text)
            .into_iter()
            .map(|l| (l.line, l.kind, l.is_image, l.text, l.target))
            .collect()
    }

    fn link(
        line: usize,
        kind: LinkKind,
        is_image: bool,
        text: &str,
        target: &str,
    ) -> (usize, LinkKind, bool, String, String) {
        (line, kind, is_image, text.to_string(), target.to_string())
    }

    #[test]
    fn test_inline_links() {
        let links = summary("This is [an example](http://example.com/ \"Title\") inline link.");
        assert_eq!(
            links,
            vec![link(1, LinkKind::Inline, false, "an example", "http://example.com/")]
        );
    }

    #[test]
    fn test_inline_link_with_title_across_lines() {
        let text = "a\n\nsome [text](bla.html) and [one with \n a title](k01.html \"foo\")";
        let links = summary(text);
        assert_eq!(links.len(), 2);
        assert_eq!(links[1], link(3, LinkKind::Inline, false, "one with \n a title", "k01.html"));
    }

    #[test]
    fn test_angle_brackets_are_stripped() {
        let links = summary("[x](<foo bar.html>)");
        assert_eq!(links[0].4, "foo");
        let links = summary("[x]: <k01.html>");
        assert_eq!(links[0], link(1, LinkKind::Reference, false, "x", "k01.html"));
    }

    #[test]
    fn test_images() {
        let links = summary("![alt text](bilder/bild.png)");
        assert_eq!(links, vec![link(1, LinkKind::Inline, true, "alt text", "bilder/bild.png")]);
    }

    #[test]
    fn test_nested_image_in_link() {
        let links = summary("[ ![Bildbeschreib](bilder/bild1.PNG) ](bilder.html#bild1)");
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].1, LinkKind::Inline);
        assert_eq!(links[0].4, "bilder.html#bild1");
        assert_eq!(links[1], link(1, LinkKind::Inline, true, "Bildbeschreib", "bilder/bild1.PNG"));
    }

    #[test]
    fn test_page_links() {
        let links = summary("Seiten: [[15]](#seite-15--),\n [[20]](#seite-20--)");
        assert_eq!(
            links,
            vec![
                link(1, LinkKind::Inline, false, "[15]", "#seite-15--"),
                link(1, LinkKind::Labeled, false, "15", ""),
                link(2, LinkKind::Inline, false, "[20]", "#seite-20--"),
                link(2, LinkKind::Labeled, false, "20", ""),
            ]
        );
    }

    #[test]
    fn test_labeled_links() {
        let links = summary("[1]\n\\![test][]\nabc ![test2] def\n[foo][bar]");
        assert_eq!(
            links,
            vec![
                link(1, LinkKind::Labeled, false, "1", ""),
                link(2, LinkKind::Labeled, false, "test", ""),
                link(3, LinkKind::Labeled, true, "test2", ""),
                link(4, LinkKind::Labeled, false, "foo", "bar"),
            ]
        );
    }

    #[test]
    fn test_references() {
        let links = summary("[my label 4]: /bar#Special  'A title'\n\n![img]: bilder/a.png");
        assert_eq!(
            links,
            vec![
                link(1, LinkKind::Reference, false, "my label 4", "/bar#Special"),
                link(3, LinkKind::Reference, true, "img", "bilder/a.png"),
            ]
        );
    }

    #[test]
    fn test_escaped_brackets() {
        let links = summary("[a\\[], [\\]], [\\[\\]] and \n[](\\])");
        assert_eq!(
            links,
            vec![
                link(1, LinkKind::Labeled, false, "a\\[", ""),
                link(1, LinkKind::Labeled, false, "\\]", ""),
                link(1, LinkKind::Labeled, false, "\\[\\]", ""),
                link(2, LinkKind::Inline, false, "", "\\]"),
            ]
        );
        assert!(summary("\\[no link\\]").is_empty());
    }

    #[test]
    fn test_links_in_formulas_are_ignored() {
        assert!(summary("Formula (e.g. $\\sqrt[5]{8547799037)}$.").is_empty());
        assert!(summary("$$ blok [x](y)\n nor [ref]:abc.com $$").is_empty());
        let links = summary("\\$ there is [formula] \\$");
        assert_eq!(links, vec![link(1, LinkKind::Labeled, false, "formula", "")]);
        let links = summary("\\$ not even in [link \\$ test]: reference");
        assert_eq!(links[0].3, "link \\$ test");
        assert_eq!(links[0].1, LinkKind::Reference);
    }

    #[test]
    fn test_line_numbers() {
        let text = "\n[a](b)\n[c][]\n\n[d]: e\n\nfoo ![f](g)";
        let lines: Vec<usize> = find_links_in_markdown(text).iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![2, 3, 5, 7]);
    }

    #[test]
    fn test_footnotes() {
        let links = summary("[^3]: test\n");
        assert_eq!(links, vec![link(1, LinkKind::ReferenceFootnote, false, "^3", "test\n")]);

        let text = "[^1]: [k05025](k0502.html#head-1) asdsad\nasdsad\n\nabc";
        let links = summary(text);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].1, LinkKind::ReferenceFootnote);
        assert_eq!(links[0].4, "[k05025](k0502.html#head-1) asdsad\nasdsad\n");
        assert_eq!(links[1], link(1, LinkKind::Inline, false, "k05025", "k0502.html#head-1"));
    }

    #[test]
    fn test_html_ids() {
        let ids = get_html_elements_ids_from_document(
            "<div id=\"my_id\">x</div> <span class=\"a\" id='other'/> <DiV><DIV id=\"my_id2\">",
        );
        assert!(ids.contains("my_id"));
        assert!(ids.contains("other"));
        assert!(ids.contains("my_id2"));
        assert!(get_html_elements_ids_from_document("<div id=\"\"/>").is_empty());
        assert!(get_html_elements_ids_from_document("<p id=\"x\">").is_empty());
    }
}
