//! Blanking out code so that checkers do not report its content.

use super::paragraphs::Paragraphs;
use regex::Regex;
use std::sync::OnceLock;

const FENCES: [&str; 2] = ["~~~", "```"];

fn inline_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`.*?`").unwrap())
}

fn is_indented(line: &str) -> bool {
    line.is_empty() || line.starts_with("    ") || line.starts_with('\t')
}

fn all_indented(lines: &[String]) -> bool {
    lines.iter().all(|l| is_indented(l))
}

fn is_list_item(line: &str) -> bool {
    let line = line.trim_start();
    ["- ", "+ ", "* "].iter().any(|bullet| line.starts_with(bullet))
}

/// Check whether an indented paragraph continues an itemize instead of being
/// a code block. Walks back over indented paragraphs until an itemize or
/// regular text is found.
fn is_indented_itemize(paragraphs: &Paragraphs, start: usize) -> bool {
    for (_, lines) in paragraphs.range(..start).rev() {
        if lines.iter().any(|l| is_list_item(l)) {
            return true;
        }
        if !all_indented(lines) {
            return false;
        }
    }
    false
}

/// Replace the content of code blocks and inline code by blank lines or
/// spaces. Fenced blocks may span multiple paragraphs; indented paragraphs are
/// treated as code unless they belong to an itemize.
pub fn rm_codeblocks(paragraphs: &Paragraphs) -> Paragraphs {
    let mut result = Paragraphs::new();
    let mut open_fence: Option<&str> = None;
    for (&start, lines) in paragraphs {
        let mut touched_fence = open_fence.is_some();
        let mut new_lines = Vec::with_capacity(lines.len());
        for line in lines {
            let trimmed = line.trim_start();
            match open_fence {
                Some(fence) => {
                    if trimmed.starts_with(fence) {
                        open_fence = None;
                    }
                    new_lines.push(String::new());
                }
                None => {
                    if let Some(&fence) = FENCES.iter().find(|f| trimmed.starts_with(**f)) {
                        open_fence = Some(fence);
                        touched_fence = true;
                        new_lines.push(String::new());
                    } else {
                        new_lines.push(strip_inline_code(line));
                    }
                }
            }
        }
        if !touched_fence && all_indented(lines) && !is_indented_itemize(paragraphs, start) {
            new_lines = vec![String::new(); lines.len()];
        }
        result.insert(start, new_lines);
    }
    result
}

fn strip_inline_code(line: &str) -> String {
    let ticks = line.matches('`').count();
    if ticks > 0 && ticks % 2 == 0 {
        inline_code().replace_all(line, "  ").into_owned()
    } else {
        line.to_string()
    }
}
