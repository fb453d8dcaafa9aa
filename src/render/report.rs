//! Presentation of Mistkerl results.

use crate::qa::ErrorMessage;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Message shown when a lecture is free of mistakes.
pub const NO_MISTAKES: &str = "No errors found. Hopefully there are none :-).";

/// Mistakes grouped by the file they were found in, each group sorted by
/// line and position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MistakeReport {
    files: BTreeMap<String, Vec<ErrorMessage>>,
}

impl MistakeReport {
    pub fn new(mistakes: impl IntoIterator<Item = ErrorMessage>) -> Self {
        let mut files: BTreeMap<String, Vec<ErrorMessage>> = BTreeMap::new();
        for mistake in mistakes {
            let path = mistake
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            files.entry(path).or_default().push(mistake);
        }
        for messages in files.values_mut() {
            // messages without location come first
            messages.sort_by_key(|m| (m.lineno, m.pos));
        }
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total number of mistakes.
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Paths with their mistakes.
    pub fn files(&self) -> impl Iterator<Item = (&str, &[ErrorMessage])> {
        self.files.iter().map(|(p, m)| (p.as_str(), m.as_slice()))
    }

    fn location(mistake: &ErrorMessage) -> Option<String> {
        match (mistake.lineno, mistake.pos) {
            (Some(line), Some(pos)) => Some(format!("{}, {}", line, pos)),
            (Some(line), None) => Some(line.to_string()),
            (None, Some(pos)) => Some(pos.to_string()),
            (None, None) => None,
        }
    }

    /// JSON representation: an object mapping paths to lists whose entries
    /// are either a plain message or `{"line, pos": message}`.
    pub fn to_json(&self) -> Value {
        if self.is_empty() {
            return Value::String(NO_MISTAKES.into());
        }
        let files = self
            .files
            .iter()
            .map(|(path, mistakes)| {
                let entries = mistakes
                    .iter()
                    .map(|m| match Self::location(m) {
                        Some(location) => {
                            let mut entry = Map::new();
                            entry.insert(location, Value::String(m.message.clone()));
                            Value::Object(entry)
                        }
                        None => Value::String(m.message.clone()),
                    })
                    .collect();
                (path.clone(), Value::Array(entries))
            })
            .collect();
        Value::Object(files)
    }

    /// Human readable report. `squeeze` drops the blank lines between
    /// messages.
    pub fn format_text(&self, squeeze: bool) -> String {
        if self.is_empty() {
            return NO_MISTAKES.to_string();
        }
        let separator = if squeeze { "\n" } else { "\n\n" };
        let mut out = String::new();
        for (path, mistakes) in &self.files {
            let _ = writeln!(out, "{}", path);
            let _ = writeln!(out, "{}", "-".repeat(path.chars().count()));
            let rendered: Vec<String> = mistakes
                .iter()
                .map(|m| match Self::location(m) {
                    Some(location) => format!("{}: {}", location, m.message),
                    None => m.message.clone(),
                })
                .collect();
            out.push_str(&rendered.join(separator));
            out.push_str(separator);
            if !squeeze {
                out.push('\n');
            }
        }
        out.trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mistakes() -> Vec<ErrorMessage> {
        vec![
            ErrorMessage::at_line("zweiter", 9).with_path("k01/k01.md"),
            ErrorMessage::at_line("erster", 2).with_pos(4).with_path("k01/k01.md"),
            ErrorMessage::new("Verzeichnis").with_path("k01"),
            ErrorMessage::new("ohne Zeile").with_path("k01/k01.md"),
        ]
    }

    #[test]
    fn test_grouped_and_sorted() {
        let report = MistakeReport::new(mistakes());
        assert_eq!(report.len(), 4);
        let files: Vec<_> = report.files().map(|(p, m)| (p, m.len())).collect();
        assert_eq!(files, vec![("k01", 1), ("k01/k01.md", 3)]);
        let messages: Vec<_> = report.files().nth(1).unwrap().1.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(messages, vec!["ohne Zeile", "erster", "zweiter"]);
    }

    #[test]
    fn test_json_layout() {
        let value = MistakeReport::new(mistakes()).to_json();
        assert_eq!(value["k01"][0], "Verzeichnis");
        assert_eq!(value["k01/k01.md"][1]["2, 4"], "erster");
        assert_eq!(value["k01/k01.md"][2]["9"], "zweiter");
    }

    #[test]
    fn test_empty_report() {
        let report = MistakeReport::new(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.to_json(), Value::String(NO_MISTAKES.into()));
        assert_eq!(report.format_text(false), NO_MISTAKES);
    }

    #[test]
    fn test_text_squeezed() {
        let text = MistakeReport::new(mistakes()).format_text(true);
        assert!(text.contains("k01/k01.md\n----------\nohne Zeile\n2, 4: erster\n9: zweiter"));
    }
}
