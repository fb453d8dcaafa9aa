//! Translations of the phrases matuc writes into generated documents.

/// German translations, keyed by the English phrase.
const GERMAN: &[(&str, &str)] = &[
    ("page", "Seite"),
    ("pages", "Seiten"),
    ("previous", "Vorherige"),
    ("next", "Nächste"),
    ("table of contents", "Inhalt"),
    ("title of table of contents", "Inhaltsverzeichnis"),
    ("chapter", "Kapitel"),
    ("chapters", "Kapitel"),
    ("paper", "Blatt"),
    ("preface", "Vorwort"),
    ("appendix", "Anhang"),
    ("not edited", "nicht bearbeitet"),
    ("images", "bilder"),
    ("image descriptions", "Bildbeschreibungen"),
    ("outsourced image description", "Bildbeschreibung ausgelagert"),
    ("description of image", "Bildbeschreibung von"),
    ("title page", "Titelblatt"),
    ("glossary", "Glossar"),
    ("index", "Index"),
    ("abbreviations", "Abkürzungsverzeichnis"),
    ("tactile materials", "Taktile Materialien"),
    ("copyright", "Urheberrecht"),
    ("remarks about the accessible version", "Hinweise zur barrierefreien Version"),
    ("frame", "Rahmen"),
    ("box", "Box"),
    ("end of frame", "Rahmenende"),
    ("end of box", "Boxende"),
    ("black", "schwarz"),
    ("blue", "blau"),
    ("brown", "braun"),
    ("grey", "grau"),
    ("green", "grün"),
    ("orange", "orange"),
    ("red", "rot"),
    ("violet", "violett"),
    ("yellow", "gelb"),
    ("source", "Quelle"),
    ("author", "Autor"),
    ("edited by", "bearbeitet von"),
    ("semester of edit", "Semester der Bearbeitung"),
    ("working group", "Arbeitsgruppe"),
    ("institution", "Institution"),
    ("note of editor", "Anmerkung des Bearbeiters"),
    ("title", "Titel"),
    ("black frame", "schwarzer Rahmen"),
    ("blue frame", "blauer Rahmen"),
    ("brown frame", "brauner Rahmen"),
    ("grey frame", "grauer Rahmen"),
    ("green frame", "grüner Rahmen"),
    ("orange frame", "oranger Rahmen"),
    ("red frame", "roter Rahmen"),
    ("violet frame", "violetter Rahmen"),
    ("yellow frame", "gelber Rahmen"),
    ("black box", "schwarze Box"),
    ("blue box", "blaue Box"),
    ("brown box", "braune Box"),
    ("grey box", "graue Box"),
    ("green box", "grüne Box"),
    ("orange box", "orange Box"),
    ("red box", "rote Box"),
    ("violet box", "violette Box"),
    ("yellow box", "gelbe Box"),
];

/// English phrases whose display form differs from the lookup key.
const ENGLISH: &[(&str, &str)] = &[
    ("page", "Page"),
    ("pages", "Pages"),
    ("previous", "Previous"),
    ("next", "Next"),
    ("table of contents", "Table of Contents"),
    ("title of table of contents", "Table Of Contents"),
    ("chapter", "Chapter"),
    ("chapters", "Chapters"),
    ("paper", "Paper"),
    ("preface", "Preface"),
    ("appendix", "Appendix"),
    ("image descriptions", "Image descriptions"),
    ("outsourced image description", "Outsourced image description"),
    ("description of image", "Description of image"),
    ("title page", "Title page"),
    ("glossary", "Glossary"),
    ("index", "Index"),
    ("abbreviations", "Abbreviations"),
    ("tactile materials", "Tactile materials"),
    ("copyright", "Copyright"),
    ("remarks about the accessible version", "Remarks about the accessible version"),
    ("frame", "Frame"),
    ("box", "Box"),
    ("end of frame", "End of frame"),
    ("end of box", "End of box"),
    ("source", "Source"),
    ("author", "Author"),
    ("edited by", "edited by"),
    ("semester of edit", "Semester of edit"),
    ("working group", "Working group"),
    ("institution", "Institution"),
    ("note of editor", "Note of editor"),
    ("title", "Title"),
];

/// Translator for the supported languages (`de`, `en`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translate {
    language: String,
}

impl Translate {
    /// Languages with a translation table.
    pub const SUPPORTED_LANGUAGES: [&'static str; 2] = ["de", "en"];

    /// Create a translator for the given language code.
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into().to_lowercase(),
        }
    }

    /// Language code in use.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Translate a phrase. Unknown phrases and languages yield the phrase
    /// itself.
    pub fn get(&self, phrase: &str) -> String {
        let table: &[(&str, &str)] = match self.language.as_str() {
            "de" => GERMAN,
            "en" => ENGLISH,
            _ => &[],
        };
        let key = phrase.to_lowercase();
        table
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .unwrap_or_else(|| phrase.to_string())
    }

    /// Translate into every supported language, e.g. to recognise image
    /// directories regardless of the lecture language.
    pub fn all_translations(phrase: &str) -> Vec<String> {
        Self::SUPPORTED_LANGUAGES
            .iter()
            .map(|lang| Translate::new(*lang).get(phrase))
            .collect()
    }
}

impl Default for Translate {
    fn default() -> Self {
        Self::new("de")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_german() {
        let t = Translate::new("de");
        assert_eq!(t.get("page"), "Seite");
        assert_eq!(t.get("Next"), "Nächste");
    }

    #[test]
    fn test_english() {
        let t = Translate::new("EN");
        assert_eq!(t.language(), "en");
        assert_eq!(t.get("previous"), "Previous");
        assert_eq!(t.get("images"), "images");
    }

    #[test]
    fn test_unknown_language_falls_back_to_phrase() {
        assert_eq!(Translate::new("cs").get("page"), "page");
        assert_eq!(Translate::new("de").get("no such phrase"), "no such phrase");
    }

    #[test]
    fn test_all_translations() {
        assert_eq!(Translate::all_translations("images"), vec!["bilder", "images"]);
    }
}
