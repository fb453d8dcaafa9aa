//! The Mistkerl: runs all checks over a file or a lecture.

use super::linkchecker::{extract_document_links, LinkExtractor, LinkRecord};
use super::meta::{
    raw_page_numbers, DirectoryHeadings, DirectoryPageNumbers, ErrorMessage, Mistake,
    MistakeInput, MistakePriority, MistakeType, RawPageNumber,
};
use crate::config::{ConfFactory, MetaInfo, MAX_FILE_LINES};
use crate::error::Result;
use crate::filesystem::FileWalker;
use crate::model::Heading;
use crate::parser::{extract_headings_from_par, file2paragraphs, parse_formulas, rm_codeblocks, Paragraphs};
use log::debug;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Endings of files the Mistkerl looks at.
const CHECKED_ENDINGS: [&str; 3] = [".md", ".tex", ".dcxml"];

/// Reassemble paragraphs into a document with `line_count` lines. Lines not
/// covered by a paragraph stay empty, so line numbers are preserved.
pub fn paragraphs_to_text(paragraphs: &Paragraphs, line_count: usize) -> String {
    let total = paragraphs
        .iter()
        .map(|(start, lines)| (start + lines.len()).saturating_sub(1))
        .max()
        .unwrap_or(0)
        .max(line_count);
    let mut document = vec![""; total];
    for (start, lines) in paragraphs {
        for (offset, line) in lines.iter().enumerate() {
            if let Some(slot) = document.get_mut((start + offset).saturating_sub(1)) {
                *slot = line.as_str();
            }
        }
    }
    document.join("\n")
}

fn of_type<'a>(
    checks: &'a [&'a dyn Mistake],
    kind: MistakeType,
) -> impl Iterator<Item = &'a dyn Mistake> + 'a {
    checks
        .iter()
        .copied()
        .filter(move |c| c.mistake_type() == kind)
}

/// Results of checking a single file.
#[derive(Debug, Default)]
struct FileReport {
    path: PathBuf,
    errors: Vec<ErrorMessage>,
    headings: Vec<Heading>,
    page_numbers: Vec<RawPageNumber>,
    links: Vec<LinkRecord>,
    anchors: BTreeSet<String>,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Default::default()
        }
    }

    fn push(&mut self, error: Option<ErrorMessage>) {
        if let Some(error) = error {
            self.errors.push(error.with_path(&self.path));
        }
    }
}

/// Runs checks over the files of a lecture and collects the mistakes.
///
/// ```no_run
/// use matuc::qa::{Mistkerl, MistakePriority};
///
/// let errors = Mistkerl::new()
///     .with_priority(MistakePriority::Critical)
///     .run("lecture")?;
/// for error in errors {
///     println!("{}", error);
/// }
/// # Ok::<(), matuc::Error>(())
/// ```
pub struct Mistkerl {
    checks: Option<Vec<Arc<dyn Mistake>>>,
    priority: MistakePriority,
    check_links: bool,
}

impl Default for Mistkerl {
    fn default() -> Self {
        Self {
            checks: None,
            priority: MistakePriority::Normal,
            check_links: true,
        }
    }
}

impl Mistkerl {
    /// Create a Mistkerl running all checks of normal or higher priority.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only report mistakes at least as severe as `priority`.
    pub fn with_priority(mut self, priority: MistakePriority) -> Self {
        self.priority = priority;
        self
    }

    /// Replace the default checks.
    pub fn with_checks(mut self, checks: Vec<Arc<dyn Mistake>>) -> Self {
        self.checks = Some(checks);
        self
    }

    /// Enable or disable the link checker.
    pub fn with_link_checking(mut self, enabled: bool) -> Self {
        self.check_links = enabled;
        self
    }

    /// Check a file or all files below a directory. The result is sorted by
    /// path, line and position.
    pub fn run(&self, path: impl AsRef<Path>) -> Result<Vec<ErrorMessage>> {
        let path = path.as_ref();
        let checks = match &self.checks {
            Some(checks) => checks.clone(),
            None => {
                let conf = ConfFactory::new().get_conf_instance(path)?;
                let toc_depth = conf.get_number(MetaInfo::TocDepth).unwrap_or(5);
                super::all_checks(u8::try_from(toc_depth).unwrap_or(u8::MAX))
            }
        };
        let checks: Vec<Arc<dyn Mistake>> = checks
            .into_iter()
            .filter(|c| c.priority() <= self.priority)
            .collect();

        let walker = FileWalker::new(path)
            .with_ignore_non_chapter_prefixed(false)
            .with_endings(CHECKED_ENDINGS);
        let mut errors = Vec::new();
        let mut extractor = LinkExtractor::new();
        for (directory, _, files) in walker.walk()? {
            let reports: Vec<FileReport> = files
                .par_iter()
                .map(|file| self.check_file(&directory.join(file), &checks))
                .collect();
            errors.extend(self.check_directory(&directory, &reports, &checks));
            for report in reports {
                errors.extend(report.errors);
                extractor.add_extracted(report.links, (report.path, report.anchors));
            }
        }
        if self.check_links {
            let mut checker = extractor.into_checker();
            checker.run_checks();
            errors.extend(checker.into_errors());
        }
        errors.sort_by(|a, b| (&a.path, a.lineno, a.pos).cmp(&(&b.path, b.lineno, b.pos)));
        Ok(errors)
    }

    fn check_file(&self, path: &Path, checks: &[Arc<dyn Mistake>]) -> FileReport {
        debug!("checking {}", path.display());
        let mut report = FileReport::new(path);
        let checks: Vec<&dyn Mistake> = checks
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| c.applies_to(path))
            .collect();

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                report.push(Some(ErrorMessage::new(format!(
                    "Die Datei konnte nicht gelesen werden: {}",
                    e
                ))));
                return report;
            }
        };
        let Ok(text) = String::from_utf8(bytes) else {
            report.push(Some(ErrorMessage::new(
                "Datei ist nicht in UTF-8 kodiert, bitte wähle \"UTF-8\" als Zeichensatz im \
                 Editor.",
            )));
            return report;
        };
        for check in of_type(&checks, MistakeType::Configuration) {
            report.push(check.check(&MistakeInput::Configuration(path)));
        }
        if path.extension().is_some_and(|e| e == "dcxml") {
            return report;
        }

        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        let line_count = text.split('\n').count();
        let paragraphs = rm_codeblocks(&file2paragraphs(&text, false));
        let stripped = paragraphs_to_text(&paragraphs, line_count);

        for check in of_type(&checks, MistakeType::FullFile) {
            report.push(check.check(&MistakeInput::FullFile(&stripped)));
        }
        if line_count > MAX_FILE_LINES {
            report.push(Some(ErrorMessage::new(format!(
                "Die Datei ist zu lang. Um die Navigation zu erleichtern und die einfache \
                 Lesbarkeit zu gewährleisten, sollten lange Kapitel mit mehr als {} Zeilen in \
                 mehrere Unterdateien nach dem Schema kxxyy.md oder kleiner aufgeteilt werden.",
                MAX_FILE_LINES
            ))));
        }
        let mut oneliners: Vec<&dyn Mistake> = of_type(&checks, MistakeType::Oneliner).collect();
        for (idx, line) in stripped.split('\n').enumerate() {
            if oneliners.is_empty() {
                break;
            }
            let mut hits = Vec::new();
            oneliners.retain(|check| match check.check(&MistakeInput::Line(idx + 1, line)) {
                Some(error) => {
                    hits.push(error);
                    false
                }
                None => true,
            });
            hits.into_iter().for_each(|hit| report.push(Some(hit)));
        }
        for check in of_type(&checks, MistakeType::Paragraphs) {
            report.push(check.check(&MistakeInput::Paragraphs(&paragraphs)));
        }
        let formulas = parse_formulas(&paragraphs);
        for check in of_type(&checks, MistakeType::Formulas) {
            report.push(check.check(&MistakeInput::Formulas(&formulas)));
        }

        let headings = extract_headings_from_par(&paragraphs, None);
        for check in of_type(&checks, MistakeType::Headings) {
            report.push(check.check(&MistakeInput::Headings(&headings)));
        }
        let page_numbers = raw_page_numbers(&stripped);
        for check in of_type(&checks, MistakeType::PageNumbers) {
            report.push(check.check(&MistakeInput::PageNumbers(&page_numbers)));
        }
        report.headings = headings;
        report.page_numbers = page_numbers;

        if path.extension().is_some_and(|e| e == "md") {
            let (links, (_, anchors)) = extract_document_links(path, &stripped, &paragraphs);
            report.links = links;
            report.anchors = anchors;
        }
        report
    }

    /// Run the checks which need the headings or page numbers of all files
    /// of a directory.
    fn check_directory(
        &self,
        directory: &Path,
        reports: &[FileReport],
        checks: &[Arc<dyn Mistake>],
    ) -> Vec<ErrorMessage> {
        let markdown = || {
            reports
                .iter()
                .filter(|r| r.path.extension().is_some_and(|e| e == "md"))
        };
        if markdown().next().is_none() {
            return Vec::new();
        }
        let headings: DirectoryHeadings = markdown()
            .map(|r| (r.path.clone(), r.headings.clone()))
            .collect();
        let page_numbers: DirectoryPageNumbers = markdown()
            .map(|r| (r.path.clone(), r.page_numbers.clone()))
            .collect();
        checks
            .iter()
            .filter_map(|check| match check.mistake_type() {
                MistakeType::HeadingsDir => check.check(&MistakeInput::HeadingsDir(&headings)),
                MistakeType::PageNumbersDir => {
                    check.check(&MistakeInput::PageNumbersDir(&page_numbers))
                }
                _ => None,
            })
            .map(|error| error.with_path(directory))
            .collect()
    }
}
