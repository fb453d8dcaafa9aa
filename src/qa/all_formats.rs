//! Checks which are neither specific to MarkDown nor to LaTeX.

use super::meta::{ErrorMessage, Mistake, MistakeInput, MistakePriority, MistakeType};
use crate::config::{get_lnum_of_tag, read_stored_values, MetaInfo};

/// Every configuration value is needed for the HTML meta data.
pub struct ConfigurationValuesAreAllSet;

impl Mistake for ConfigurationValuesAreAllSet {
    fn name(&self) -> &'static str {
        "configuration_values_are_all_set"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Configuration
    }

    fn file_types(&self) -> &'static [&'static str] {
        &["dcxml"]
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::Configuration(path) = input else {
            return None;
        };
        let values = match read_stored_values(path) {
            Ok(values) => values,
            Err(e) => {
                return Some(
                    ErrorMessage::new(format!("Die Konfiguration ist fehlerhaft: {}", e))
                        .with_path(*path),
                )
            }
        };
        let stored = |key: MetaInfo| values.iter().find(|(k, _)| *k == key).map(|(_, v)| v);
        MetaInfo::ALL.into_iter().find_map(|key| {
            let unset = stored(key)
                .map_or(true, |v| v.trim().is_empty() || v.to_lowercase().contains("unknown"));
            if !unset {
                return None;
            }
            let message = ErrorMessage::new(format!(
                "Fehler in der Konfiguration: Der Wert {} ist nicht gesetzt, wodurch die \
                 Kopfdaten in den HTML-Dateien nicht erzeugt werden können.",
                key
            ))
            .with_path(*path);
            Some(match get_lnum_of_tag(path, key.tag()) {
                Ok(Some(line)) => message.with_line(line),
                _ => message,
            })
        })
    }
}

/// Umlauts copied from PDF files often consist of a vowel and a separate
/// diacritic, which screen readers cannot read.
pub struct BrokenUmlautsFromPdfFiles;

impl BrokenUmlautsFromPdfFiles {
    const GARBLED: [&'static str; 11] = [
        "\u{b4}\u{131}",
        "\u{a8}\u{131}",
        "\u{b8}c",
        "\u{a8}a",
        "\u{a8}o",
        "\u{a8}u",
        "\u{a8}s",
        "\u{a8} a",
        "\u{a8} o",
        "\u{a8} u",
        "\u{a8} s",
    ];
}

impl Mistake for BrokenUmlautsFromPdfFiles {
    fn name(&self) -> &'static str {
        "broken_umlauts_from_pdf_files"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Oneliner
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::Line(lineno, line) = input else {
            return None;
        };
        Self::GARBLED.iter().any(|seq| line.contains(seq)).then(|| {
            ErrorMessage::at_line(
                "Es wurden inkorrekt dargestellte Umlaute gefunden. Dies geschieht oft, wenn \
                 Text aus PDF-Dateien kopiert wird. Diese kaputten Umlaute machen den Text \
                 allerdings schwer leserlich.",
                *lineno,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LectureMetaData, CONF_FILE_NAME};
    use tempfile::TempDir;

    #[test]
    fn test_broken_umlauts() {
        let check = |t: &str| BrokenUmlautsFromPdfFiles.check(&MistakeInput::Line(2, t));
        assert!(check("Gr\u{a8}o\u{df}e").is_some());
        assert!(check("Text mit \u{a8}-Zeichen").is_none());
        assert!(check("Größe").is_none());
    }

    #[test]
    fn test_configuration_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONF_FILE_NAME);
        let mut conf = LectureMetaData::new(&path);
        conf.set(MetaInfo::Editor, "Jane Doe");
        conf.write().unwrap();
        let check = || ConfigurationValuesAreAllSet.check(&MistakeInput::Configuration(&path));
        let err = check().unwrap();
        assert!(err.message.contains("SourceAuthor"));
        assert_eq!(err.lineno, get_lnum_of_tag(&path, MetaInfo::SourceAuthor.tag()).unwrap());

        for key in MetaInfo::ALL {
            if conf.get(key).trim().is_empty() || conf.get(key).to_lowercase().contains("unknown") {
                conf.set(key, "gesetzt");
            }
        }
        conf.write().unwrap();
        assert!(check().is_none());
    }

    #[test]
    fn test_broken_configuration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONF_FILE_NAME);
        std::fs::write(&path, "<metadata><dc:title>x</metadata>").unwrap();
        assert!(ConfigurationValuesAreAllSet
            .check(&MistakeInput::Configuration(&path))
            .is_some());
    }
}
