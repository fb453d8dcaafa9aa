//! Link checking for MarkDown lectures.
//!
//! Links point to the converted documents, so a link to `k01.html` is valid
//! when `k01.md` exists. The checker itself does not parse documents; it
//! works on the link records and anchors gathered by [`LinkExtractor`].

use super::meta::ErrorMessage;
use crate::error::{Error, Result};
use crate::parser::{
    extract_headings_from_par, extract_page_numbers_from_par, find_links_in_markdown,
    get_html_elements_ids_from_document, Link, LinkKind, Paragraphs,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

/// Extensions a picture may have.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "svg", "bmp"];

/// Extensions of documents, which cannot be shown as picture.
pub const DOCUMENT_EXTENSIONS: [&str; 2] = ["html", "md"];

/// Anchors per document: heading ids, ids of `div`/`span` elements and page
/// number anchors.
pub type Anchors = HashMap<PathBuf, BTreeSet<String>>;

/// Format extensions as human readable enumeration, e.g. `.jpg or .bmp`.
pub fn format_extensions_list(extensions: &[&str]) -> Result<String> {
    match extensions {
        [] => Err(Error::Other("no extensions given".into())),
        [single] => Ok(format!(".{}", single)),
        [init @ .., last] => Ok(format!(
            "{} or .{}",
            init.iter()
                .map(|e| format!(".{}", e))
                .collect::<Vec<_>>()
                .join(", "),
            last
        )),
    }
}

/// A link together with the document it was found in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Document containing the link
    pub file: PathBuf,

    /// The link itself
    pub link: Link,
}

impl LinkRecord {
    pub fn new(file: impl Into<PathBuf>, link: Link) -> Self {
        Self {
            file: file.into(),
            link,
        }
    }

    fn error(&self, message: impl Into<String>) -> ErrorMessage {
        ErrorMessage::at_line(message, self.link.line).with_path(&self.file)
    }

    /// Label a labeled link refers to: the explicit label or, for `[text][]`
    /// and `[text]`, the text.
    fn label(&self) -> &str {
        if self.link.target.is_empty() {
            &self.link.text
        } else {
            &self.link.target
        }
    }
}

/// Whether a link leaves the lecture and is hence not checked.
fn is_external(target: &str) -> bool {
    target.to_lowercase().starts_with("www.")
        || target.contains("://")
        || target.starts_with("mailto:")
}

/// Split a link target into path and fragment.
fn split_fragment(target: &str) -> (&str, Option<&str>) {
    match target.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (target, None),
    }
}

/// Resolve `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

fn extension_of(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// Collects links and anchors of the documents of a lecture.
#[derive(Debug, Default)]
pub struct LinkExtractor {
    links: Vec<LinkRecord>,
    anchors: Anchors,
}

impl LinkExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document. `paragraphs` are expected to be free of code, so
    /// that examples in code blocks are not mistaken for links.
    pub fn add_document(&mut self, path: impl Into<PathBuf>, text: &str, paragraphs: &Paragraphs) {
        let (links, anchors) = extract_document_links(path, text, paragraphs);
        self.add_extracted(links, anchors);
    }

    /// Register links and anchors extracted with [`extract_document_links`].
    pub fn add_extracted(&mut self, links: Vec<LinkRecord>, anchors: (PathBuf, BTreeSet<String>)) {
        self.links.extend(links);
        self.anchors.entry(normalize(&anchors.0)).or_default().extend(anchors.1);
    }

    pub fn links(&self) -> &[LinkRecord] {
        &self.links
    }

    /// Create a checker for all collected links.
    pub fn into_checker(self) -> LinkChecker {
        LinkChecker::new(self.links, self.anchors)
    }
}

/// Extract the links and the anchors of a single document.
pub fn extract_document_links(
    path: impl Into<PathBuf>,
    text: &str,
    paragraphs: &Paragraphs,
) -> (Vec<LinkRecord>, (PathBuf, BTreeSet<String>)) {
    let path = path.into();
    let links = find_links_in_markdown(text)
        .into_iter()
        .map(|link| LinkRecord::new(&path, link))
        .collect();
    let mut anchors = get_html_elements_ids_from_document(text);
    anchors.extend(
        extract_headings_from_par(paragraphs, None)
            .iter()
            .map(|h| h.id()),
    );
    anchors.extend(
        extract_page_numbers_from_par(paragraphs, None)
            .iter()
            .map(|p| p.anchor_id()),
    );
    (links, (path, anchors))
}

/// Checks link records for broken targets, missing labels and misused image
/// links.
#[derive(Debug, Default)]
pub struct LinkChecker {
    links: Vec<LinkRecord>,
    anchors: Anchors,
    errors: Vec<ErrorMessage>,
}

impl LinkChecker {
    pub fn new(links: Vec<LinkRecord>, anchors: Anchors) -> Self {
        Self {
            links,
            anchors,
            errors: Vec::new(),
        }
    }

    /// Errors found by [`LinkChecker::run_checks`].
    pub fn errors(&self) -> &[ErrorMessage] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ErrorMessage> {
        self.errors
    }

    /// A reference (`[label]: target`) has to be used by a labeled link in
    /// the same document.
    pub fn find_link_for_reference(&self, record: &LinkRecord) -> Option<ErrorMessage> {
        if record.link.kind != LinkKind::Reference {
            return None;
        }
        let used = self.links.iter().any(|other| {
            other.file == record.file
                && other.link.kind == LinkKind::Labeled
                && other.label().eq_ignore_ascii_case(&record.link.text)
        });
        (!used).then(|| {
            record.error(format!(
                "Die Referenz \"{}\" wird von keinem Link verwendet.",
                record.link.text
            ))
        })
    }

    /// A labeled link with explicit label and a footnote mark need a
    /// matching reference or footnote in the same document.
    pub fn find_label_for_link(&self, record: &LinkRecord) -> Option<ErrorMessage> {
        if record.link.kind != LinkKind::Labeled {
            return None;
        }
        // `[text]` without label may just be text in brackets
        if record.link.target.is_empty() && !record.link.text.starts_with('^') {
            return None;
        }
        let label = record.label();
        let defined = self.links.iter().any(|other| {
            other.file == record.file
                && matches!(
                    other.link.kind,
                    LinkKind::Reference | LinkKind::ReferenceFootnote
                )
                && other.link.text.eq_ignore_ascii_case(label)
        });
        (!defined).then(|| {
            record.error(format!(
                "Zu dem Link mit der Bezeichnung \"{}\" gibt es keine passende Referenz \
                 oder Fußnote.",
                label
            ))
        })
    }

    /// Pictures must not point to documents and links must not point to
    /// pictures.
    pub fn is_correct_extension(&self, path: &str, record: &LinkRecord) -> Option<ErrorMessage> {
        let extension = extension_of(path)?;
        if record.link.is_image && DOCUMENT_EXTENSIONS.contains(&extension.as_str()) {
            let allowed = format_extensions_list(&IMAGE_EXTENSIONS).ok()?;
            Some(record.error(format!(
                "Das Bild verweist auf \"{}\", Bilder sollten allerdings eine der Endungen \
                 {} haben.",
                path, allowed
            )))
        } else if !record.link.is_image && IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Some(record.error(format!(
                "Der Link verweist auf das Bild \"{}\". Bilder sollten mit `![Beschreibung]({})` \
                 eingebunden werden.",
                path, path
            )))
        } else {
            None
        }
    }

    /// References with the same label within one document are ambiguous.
    /// Every repetition is reported.
    pub fn find_label_duplicates(&self) -> Vec<ErrorMessage> {
        let mut seen = HashSet::new();
        self.links
            .iter()
            .filter(|r| {
                matches!(
                    r.link.kind,
                    LinkKind::Reference | LinkKind::ReferenceFootnote
                )
            })
            .filter(|r| !seen.insert((r.file.as_path(), r.link.text.to_lowercase())))
            .map(|r| {
                r.error(format!(
                    "Die Referenz \"{}\" wurde mehrfach definiert.",
                    r.link.text
                ))
            })
            .collect()
    }

    /// Check that a link target, relative to the linking document, exists.
    /// Links to `.html` files are resolved against their MarkDown source.
    /// Fragments are looked up in the anchors of the target document.
    pub fn target_exists(&self, path: &str, record: &LinkRecord, target: &str) -> Option<ErrorMessage> {
        let base = record.file.parent().unwrap_or(Path::new(""));
        let (_, fragment) = split_fragment(target);
        let document = if path.is_empty() {
            normalize(&record.file)
        } else {
            let resolved = base.join(path);
            if resolved.exists() {
                resolved
            } else {
                let source = resolved.with_extension("md");
                let is_html = extension_of(path).is_some_and(|e| e == "html" || e == "htm");
                if !(is_html && source.exists()) {
                    return Some(record.error(format!(
                        "Das Ziel \"{}\" des Links existiert nicht.",
                        target
                    )));
                }
                source
            }
        };
        let document = normalize(&document);
        let fragment = fragment.filter(|f| !f.is_empty())?;
        let anchors = self.anchors.get(&document)?;
        (!anchors.contains(fragment)).then(|| {
            record.error(format!(
                "Der Anker \"#{}\" existiert im Dokument {} nicht.",
                fragment,
                document.display()
            ))
        })
    }

    /// Run all checks over all records.
    pub fn run_checks(&mut self) -> &[ErrorMessage] {
        let mut errors = Vec::new();
        for record in &self.links {
            errors.extend(self.find_link_for_reference(record));
            errors.extend(self.find_label_for_link(record));
            if !matches!(record.link.kind, LinkKind::Inline | LinkKind::Reference) {
                continue;
            }
            let target = record.link.target.as_str();
            if target.is_empty() || is_external(target) {
                continue;
            }
            let (path, _) = split_fragment(target);
            if let Some(err) = self.is_correct_extension(path, record) {
                errors.push(err);
                continue;
            }
            errors.extend(self.target_exists(path, record, target));
        }
        errors.extend(self.find_label_duplicates());
        self.errors = errors;
        &self.errors
    }
}
