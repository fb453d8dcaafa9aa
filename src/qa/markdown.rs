//! Checks for mistakes in the MarkDown structure of lecture files.

use super::meta::{
    is_image_file, ErrorMessage, Mistake, MistakeInput, MistakePriority, MistakeType,
};
use crate::config::{page_number_pattern, PAGE_NUMBERING_TOKENS};
use crate::parser::{is_hashed_heading, parse_hashed_heading};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn page_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?i)^\|\|\s*-?\s*({})",
            PAGE_NUMBERING_TOKENS.join("|")
        ))
        .unwrap()
    })
}

fn enumeration() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\s").unwrap())
}

fn contains_page_token(text: &str) -> bool {
    let text = text.to_lowercase();
    PAGE_NUMBERING_TOKENS.iter().any(|t| text.contains(t))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_underline(line: &str) -> bool {
    let line = line.trim_end();
    !line.is_empty() && (line.chars().all(|c| c == '=') || line.chars().all(|c| c == '-'))
}

/// Lines consisting only of list characters form a horizontal rule.
fn is_rule(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| matches!(c, '-' | '*' | '+' | '_' | ' '))
}

fn is_item(line: &str) -> bool {
    (line.starts_with("- ") || enumeration().is_match(line)) && !is_rule(line)
}

/// Page numbers need a blank line above and below.
pub struct PageNumberIsParagraph;

impl Mistake for PageNumberIsParagraph {
    fn name(&self) -> &'static str {
        "page_number_is_paragraph"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::FullFile
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::FullFile(text) = input else {
            return None;
        };
        let message = "Jede Seitenzahl muss in der Zeile darüber oder darunter eine \
            Leerzeile haben, das heißt sie muss in einem eigenen Absatz stehen.";
        let mut paragraph_begun = true;
        let mut previous_line_pnum = false;
        for (idx, line) in text.split('\n').enumerate() {
            if is_blank(line) {
                paragraph_begun = true;
                previous_line_pnum = false;
                continue;
            }
            if previous_line_pnum {
                return Some(ErrorMessage::at_line(message, idx));
            }
            if page_marker().is_match(line) {
                if !paragraph_begun {
                    return Some(ErrorMessage::at_line(message, idx + 1));
                }
                previous_line_pnum = true;
            }
            paragraph_begun = false;
        }
        None
    }
}

/// Headings need a blank line above and below.
pub struct HeadingIsParagraph;

impl Mistake for HeadingIsParagraph {
    fn name(&self) -> &'static str {
        "heading_is_paragraph"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::FullFile
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::FullFile(text) = input else {
            return None;
        };
        let message = "Jede Überschrift muss in der Zeile darüber oder darunter eine \
            Leerzeile haben, das heißt sie muss in einem eigenen Absatz stehen.";
        let mut paragraph_begun = true;
        let mut previous_line_heading = false;
        for (idx, line) in text.split('\n').enumerate() {
            if is_blank(line) {
                paragraph_begun = true;
                previous_line_heading = false;
                continue;
            }
            if !paragraph_begun && is_underline(line) {
                previous_line_heading = true;
                continue;
            }
            if previous_line_heading {
                return Some(ErrorMessage::at_line(message, idx + 1));
            }
            if is_hashed_heading(line) {
                if !paragraph_begun {
                    return Some(ErrorMessage::at_line(message, idx + 1));
                }
                previous_line_heading = true;
            }
            paragraph_begun = false;
        }
        None
    }
}

/// Only one level-1 heading per directory; image descriptions do not count.
pub struct LevelOneHeading;

impl Mistake for LevelOneHeading {
    fn name(&self) -> &'static str {
        "level_one_heading"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::HeadingsDir
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::HeadingsDir(headings) = input else {
            return None;
        };
        let mut found_h1 = false;
        for (path, file_headings) in headings.iter() {
            if is_image_file(path) {
                continue;
            }
            for heading in file_headings.iter().filter(|h| h.level == 1) {
                if found_h1 {
                    let dir = path.parent().unwrap_or(Path::new("."));
                    return Some(
                        ErrorMessage::new(format!(
                            "In dem Verzeichnis {} gibt es mehr als eine Überschrift der \
                             Ebene 1. Dies ist nicht erlaubt. Beispielsweise hat jeder \
                             Foliensatz nur eine Überschrift und auch ein Kapitel wird nur \
                             mit einer Überschrift bezeichnet.",
                            dir.display()
                        ))
                        .with_path(dir)
                        .with_line(heading.line_number),
                    );
                }
                found_h1 = true;
            }
        }
        None
    }
}

/// An itemize has to be separated from preceding text by a blank line.
pub struct ItemizeIsParagraph;

impl Mistake for ItemizeIsParagraph {
    fn name(&self) -> &'static str {
        "itemize_is_paragraph"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::FullFile
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::FullFile(text) = input else {
            return None;
        };
        let mut previous: Option<&str> = None;
        for (idx, line) in text.split('\n').enumerate() {
            if is_item(line) {
                if let Some(prev) = previous {
                    let continues_list = is_item(prev) || prev.starts_with([' ', '\t']);
                    if !is_blank(prev) && !continues_list {
                        return Some(ErrorMessage::at_line(
                            "Jede Aufzählung muss darüber und darunter Leerzeilen haben, \
                             damit sie bei der Umwandlung als Aufzählung erkannt wird.",
                            idx + 1,
                        ));
                    }
                }
            }
            previous = Some(line);
        }
        None
    }
}

/// Page numbers formatted as level-6 headings are outdated.
pub struct OldstylePageNumbering;

impl Mistake for OldstylePageNumbering {
    fn name(&self) -> &'static str {
        "oldstyle_pagenumbering"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Oneliner
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let MistakeInput::Line(lineno, line) = input else {
            return None;
        };
        let re = RE.get_or_init(|| {
            Regex::new(&format!(
                r"(?i)^\s*######\s*-\s*({})",
                PAGE_NUMBERING_TOKENS.join("|")
            ))
            .unwrap()
        });
        re.is_match(line).then(|| {
            ErrorMessage::at_line(
                "Es wurde eine Seitenzahl im Format \"###### - Seite xyz -\" bzw. \
                 \"###### - Seite xyz - ######\" gefunden. Dies ist nicht mehr erlaubt. \
                 Seitenzahlen müssen die Form \"|| - Seite xyz -\" haben.",
                *lineno,
            )
        })
    }
}

/// The page word should be capitalised.
pub struct PageNumberingTextIsLowercase;

impl Mistake for PageNumberingTextIsLowercase {
    fn name(&self) -> &'static str {
        "page_numbering_text_is_lowercase"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::PageNumbers
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::PageNumbers(pnums) = input else {
            return None;
        };
        pnums
            .iter()
            .find(|(_, text)| text.contains("seite") || text.contains("folie"))
            .map(|(lineno, _)| {
                ErrorMessage::at_line(
                    "Das Wort \"Seite\" wurde klein geschrieben. Es sollte wie alle \
                     Seitenzahlen einheitlich groß geschrieben werden.",
                    *lineno,
                )
            })
    }
}

/// A page word without a number after it, e.g. `|| - Seite -`.
pub struct PageStringButNoPageNumber;

impl Mistake for PageStringButNoPageNumber {
    fn name(&self) -> &'static str {
        "page_string_but_no_page_number"
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
        if !line.starts_with("||") {
            return None;
        }
        let condensed: String = line
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        for token in PAGE_NUMBERING_TOKENS {
            if let Some(idx) = condensed.find(token) {
                let after = condensed[idx + token.len()..].chars().next();
                if after.is_some_and(|c| !c.is_alphanumeric()) {
                    return Some(ErrorMessage::at_line(
                        "Wahrscheinlich wurde an dieser Stelle eine Seitenzahl notiert, bei \
                         der nach dem Wort die anschließende Nummer vergessen wurde.",
                        *lineno,
                    ));
                }
            }
        }
        None
    }
}

/// Every page number marker has to contain a known page word.
pub struct UnknownPageString;

impl Mistake for UnknownPageString {
    fn name(&self) -> &'static str {
        "unknown_page_string"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::PageNumbers
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::PageNumbers(pnums) = input else {
            return None;
        };
        pnums
            .iter()
            .find(|(_, text)| !contains_page_token(text))
            .map(|(lineno, text)| {
                ErrorMessage::at_line(
                    format!(
                        "In der Seitenzahl \"{}\" kommt keines der folgenden Wörter vor: {}",
                        text.trim(),
                        PAGE_NUMBERING_TOKENS.join(", ")
                    ),
                    *lineno,
                )
            })
    }
}

/// All page numbers of a directory should use the same page word.
pub struct UniformPageStrings;

impl Mistake for UniformPageStrings {
    fn name(&self) -> &'static str {
        "uniform_pagestrings"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::PageNumbersDir
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::PageNumbersDir(pnums) = input else {
            return None;
        };
        let mut first: Option<(&Path, usize, String)> = None;
        for (path, file_pnums) in pnums.iter() {
            for (lineno, text) in file_pnums {
                let marker = format!("||{}", text);
                let Some(caps) = page_number_pattern().captures(&marker) else {
                    continue;
                };
                let word = caps[1].to_string();
                match &first {
                    None => first = Some((path.as_path(), *lineno, word)),
                    Some((first_path, first_line, first_word))
                        if !first_word.eq_ignore_ascii_case(&word) =>
                    {
                        let name = |p: &Path| {
                            p.file_name()
                                .map(|n| n.to_string_lossy().into_owned())
                                .unwrap_or_default()
                        };
                        let second = if *first_path == path.as_path() {
                            format!("später dann aber \"{}\"", word)
                        } else {
                            format!("in der Datei \"{}\" dann aber \"{}\"", name(path), word)
                        };
                        return Some(
                            ErrorMessage::at_line(
                                format!(
                                    "In der Datei \"{}\", Zeile {} wurde zuerst \"{}\" \
                                     verwendet, {}. Dies sollte einheitlich sein.",
                                    name(first_path),
                                    first_line,
                                    first_word,
                                    second
                                ),
                                *lineno,
                            )
                            .with_path(path),
                        );
                    }
                    Some(_) => {}
                }
            }
        }
        None
    }
}

/// Too many headings of one level make the table of contents unusable.
pub struct TooManyHeadings {
    threshold: usize,
    max_depth: u8,
}

impl Default for TooManyHeadings {
    fn default() -> Self {
        Self {
            threshold: 20,
            max_depth: 5,
        }
    }
}

impl TooManyHeadings {
    /// Ignore headings deeper than `max_depth`, usually the configured
    /// table of contents depth.
    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Mistake for TooManyHeadings {
    fn name(&self) -> &'static str {
        "too_many_headings"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::HeadingsDir
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::HeadingsDir(headings) = input else {
            return None;
        };
        let mut levels = [0usize; 6];
        let relevant = headings
            .iter()
            .filter(|(path, _)| !is_image_file(path))
            .flat_map(|(_, h)| h.iter());
        for heading in relevant {
            if heading.level == 0 || heading.level > self.max_depth {
                continue;
            }
            let idx = usize::from(heading.level.min(6)) - 1;
            levels[idx] += 1;
            levels[idx + 1..].iter_mut().for_each(|l| *l = 0);
            if levels[idx] > self.threshold {
                return Some(ErrorMessage::new(format!(
                    "Es existieren mehr als {} Überschriften der Ebene {}. Das macht das \
                     Inhaltsverzeichnis sehr unübersichtlich. Man kann entweder in der \
                     Konfiguration TocDepth kleiner setzen, um Überschriften dieser Ebene \
                     nicht ins Inhaltsverzeichnis aufzunehmen (für Foliensätze z.B. \
                     TocDepth 1) oder die Anzahl an Überschriften minimieren, sofern möglich.",
                    self.threshold, heading.level
                )));
            }
        }
        None
    }
}

/// Page numbers have to be enclosed in dashes: `|| - Seite 8 -`.
pub struct PageNumbersWithoutDashes;

impl Mistake for PageNumbersWithoutDashes {
    fn name(&self) -> &'static str {
        "page_numbers_without_dashes"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Paragraphs
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::Paragraphs(paragraphs) = input else {
            return None;
        };
        for (start, lines) in paragraphs.iter() {
            for (offset, line) in lines.iter().enumerate() {
                let Some(rest) = line.strip_prefix("||") else {
                    continue;
                };
                let rest = rest.trim();
                if !contains_page_token(rest) {
                    continue;
                }
                if rest.len() < 2 || !rest.starts_with('-') || !rest.ends_with('-') {
                    return Some(ErrorMessage::at_line(
                        "Die Seitenzahl muss die Form \"|| - Seite ZAHL -\" haben, wobei \
                         ZAHL durch eine Zahl ersetzt werden muss. Wahrscheinlich wurden die \
                         Bindestriche vergessen.",
                        start + offset,
                    ));
                }
            }
        }
        None
    }
}

/// A single dollar: open and close lines of an inline formula within a
/// paragraph.
struct InlineMath {
    open_line: usize,
    close_line: Option<usize>,
    looks_like_price: bool,
}

/// Find inline formulas in a paragraph. Display math and escaped dollars are
/// skipped.
fn inline_maths(start: usize, lines: &[String]) -> Vec<InlineMath> {
    let mut found = Vec::new();
    let mut in_display = false;
    let mut open: Option<InlineMath> = None;
    for (offset, line) in lines.iter().enumerate() {
        let lineno = start + offset;
        let chars: Vec<char> = line.chars().collect();
        let mut idx = 0;
        while idx < chars.len() {
            match chars[idx] {
                '\\' => idx += 1,
                '$' if chars.get(idx + 1) == Some(&'$') => {
                    in_display = !in_display;
                    idx += 1;
                }
                '$' if !in_display => match open.take() {
                    Some(mut math) => {
                        math.close_line = Some(lineno);
                        found.push(math);
                    }
                    None => {
                        open = Some(InlineMath {
                            open_line: lineno,
                            close_line: None,
                            looks_like_price: chars.get(idx + 1).is_some_and(char::is_ascii_digit),
                        })
                    }
                },
                _ => {}
            }
            idx += 1;
        }
    }
    found.extend(open);
    found
}

/// A single dollar which never gets closed within its paragraph.
pub struct DetectStrayingDollars;

impl Mistake for DetectStrayingDollars {
    fn name(&self) -> &'static str {
        "detect_straying_dollars"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Paragraphs
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::Paragraphs(paragraphs) = input else {
            return None;
        };
        paragraphs
            .iter()
            .flat_map(|(start, lines)| inline_maths(*start, lines))
            .find(|m| m.close_line.is_none() && !m.looks_like_price)
            .map(|m| {
                ErrorMessage::at_line(
                    "Ein Dollarzeichen leitet eine Formel ein, die nicht geschlossen wird. \
                     Entweder fehlt das schließende Dollarzeichen oder ein einzelnes \
                     Dollarzeichen muss als \\$ geschrieben werden.",
                    m.open_line,
                )
            })
    }
}

/// Inline formulas should not span lines.
pub struct InlineMathsShouldntContainNewlines;

impl Mistake for InlineMathsShouldntContainNewlines {
    fn name(&self) -> &'static str {
        "inline_maths_shouldnt_contain_newlines"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Paragraphs
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::Paragraphs(paragraphs) = input else {
            return None;
        };
        paragraphs
            .iter()
            .flat_map(|(start, lines)| inline_maths(*start, lines))
            .find(|m| m.close_line.is_some_and(|close| close != m.open_line))
            .map(|m| {
                ErrorMessage::at_line(
                    "Eine Formel im Fließtext (einfache Dollarzeichen) darf keinen \
                     Zeilenumbruch enthalten. Längere Formeln sollten als abgesetzte Formel \
                     mit doppelten Dollarzeichen gesetzt werden.",
                    m.open_line,
                )
            })
    }
}

/// HTML is not converted into all output formats. Only `div` and `span` are
/// allowed.
pub struct DoNotEmbedHtml;

impl Mistake for DoNotEmbedHtml {
    fn name(&self) -> &'static str {
        "do_not_embed_html"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Oneliner
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        static TAG: OnceLock<Regex> = OnceLock::new();
        static FORMULA: OnceLock<Regex> = OnceLock::new();
        let MistakeInput::Line(lineno, line) = input else {
            return None;
        };
        let formula = FORMULA.get_or_init(|| Regex::new(r"\$[^$]*\$").unwrap());
        let tag = TAG.get_or_init(|| {
            Regex::new(r"<(?:/\s*)?([a-zA-Z][a-zA-Z0-9]*)(?:\s+[^<>]*?)?\s*/?\s*>").unwrap()
        });
        let text = formula.replace_all(line, "");
        tag.captures_iter(&text)
            .map(|caps| caps[1].to_lowercase())
            .find(|name| name != "div" && name != "span")
            .map(|name| {
                ErrorMessage::at_line(
                    format!(
                        "Das HTML-Element \"{}\" sollte nicht verwendet werden. Nur die \
                         Elemente \"div\" und \"span\" sind erlaubt, alles andere sollte mit \
                         MarkDown ausgedrückt werden.",
                        name
                    ),
                    *lineno,
                )
            })
    }
}

/// Each image description (heading in `bilder.md`) needs a text.
pub struct DetectEmptyImageDescriptions;

impl Mistake for DetectEmptyImageDescriptions {
    fn name(&self) -> &'static str {
        "detect_empty_image_descriptions"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::FullFile
    }

    fn applies_to(&self, path: &Path) -> bool {
        is_image_file(path) && path.extension().is_some_and(|e| e == "md")
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::FullFile(text) = input else {
            return None;
        };
        let error = |lineno: usize| {
            ErrorMessage::at_line(
                "Die Bildbeschreibung unter dieser Überschrift ist leer.",
                lineno,
            )
        };
        let lines: Vec<&str> = text.split('\n').collect();
        let mut pending: Option<usize> = None;
        let mut idx = 0;
        while idx < lines.len() {
            let line = lines[idx];
            let lineno = idx + 1;
            let level = if is_hashed_heading(line) {
                Some(parse_hashed_heading(line).1)
            } else if !is_blank(line) && !is_underline(line) {
                lines.get(idx + 1).filter(|n| is_underline(n)).map(|n| {
                    idx += 1;
                    if n.starts_with('=') {
                        1
                    } else {
                        2
                    }
                })
            } else {
                None
            };
            match level {
                Some(level) => {
                    if let Some(heading_line) = pending {
                        return Some(error(heading_line));
                    }
                    pending = (level >= 2).then_some(lineno);
                }
                None if !is_blank(line) && !is_underline(line) => pending = None,
                None => {}
            }
            idx += 1;
        }
        pending.map(error)
    }
}

/// Unfinished image descriptions marked with "ToDo".
pub struct ToDosInImageDescriptionsAreBad;

impl Mistake for ToDosInImageDescriptionsAreBad {
    fn name(&self) -> &'static str {
        "todos_in_image_descriptions_are_bad"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Oneliner
    }

    fn priority(&self) -> MistakePriority {
        MistakePriority::Critical
    }

    fn applies_to(&self, path: &Path) -> bool {
        is_image_file(path)
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let MistakeInput::Line(lineno, line) = input else {
            return None;
        };
        let re = RE.get_or_init(|| Regex::new(r"(?i)\b(to)(\s*)(do)\b(\s+\w)?").unwrap());
        let is_todo = re.captures_iter(line).any(|caps| {
            // "nothing to do with" is plain English
            let plain_phrase = !caps[2].is_empty()
                && &caps[1] == "to"
                && &caps[3] == "do"
                && caps.get(4).is_some();
            !plain_phrase
        });
        is_todo.then(|| {
            ErrorMessage::at_line(
                "Eine Bildbeschreibung enthält ein \"ToDo\", sie ist daher noch nicht fertig.",
                *lineno,
            )
        })
    }
}

/// A backslash at the end of a paragraph is printed literally.
pub struct ParagraphMayNotEndOnBackslash;

impl Mistake for ParagraphMayNotEndOnBackslash {
    fn name(&self) -> &'static str {
        "paragraph_may_not_end_on_backslash"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Paragraphs
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::Paragraphs(paragraphs) = input else {
            return None;
        };
        paragraphs.iter().find_map(|(start, lines)| {
            let last = lines.last()?.trim_end();
            let backslashes = last.len() - last.trim_end_matches('\\').len();
            (backslashes % 2 == 1).then(|| {
                ErrorMessage::at_line(
                    "Ein Absatz darf nicht mit einem umgekehrten Schrägstrich (\\) enden, da \
                     dieser sonst als normales Zeichen angezeigt wird.",
                    start + lines.len() - 1,
                )
            })
        })
    }
}

/// A paragraph consisting of a single inline formula should be display math.
pub struct FreeStandingFormulasShouldBeDisplaymath;

impl Mistake for FreeStandingFormulasShouldBeDisplaymath {
    fn name(&self) -> &'static str {
        "free_standing_formulas_should_be_displaymath"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Paragraphs
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let MistakeInput::Paragraphs(paragraphs) = input else {
            return None;
        };
        let re = RE.get_or_init(|| Regex::new(r"^\$[^$]+\$$").unwrap());
        paragraphs.iter().find_map(|(start, lines)| {
            let text = lines.join("\n");
            re.is_match(text.trim()).then(|| {
                ErrorMessage::at_line(
                    "Eine Formel, die allein in einem Absatz steht, sollte als abgesetzte \
                     Formel mit doppelten Dollarzeichen gesetzt werden.",
                    *start,
                )
            })
        })
    }
}

/// Display math within running text breaks the paragraph.
pub struct DisplayMathShouldNotBeUsedWithinAParagraph;

impl Mistake for DisplayMathShouldNotBeUsedWithinAParagraph {
    fn name(&self) -> &'static str {
        "display_math_should_not_be_used_within_a_paragraph"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Oneliner
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let MistakeInput::Line(lineno, line) = input else {
            return None;
        };
        let re = RE.get_or_init(|| Regex::new(r"\$\$.*?\$\$").unwrap());
        let line = line.replace("\\$", "");
        if !re.is_match(&line) {
            return None;
        }
        let rest = re.replace_all(&line, "");
        rest.chars()
            .any(|c| !c.is_whitespace() && !matches!(c, '.' | ',' | ';' | ':'))
            .then(|| {
                ErrorMessage::at_line(
                    "Eine abgesetzte Formel (doppelte Dollarzeichen) sollte nicht innerhalb \
                     eines Absatzes stehen, sondern einen eigenen Absatz bilden. Für Formeln im \
                     Fließtext sind einfache Dollarzeichen zu verwenden.",
                    *lineno,
                )
            })
    }
}

/// List items starting with another bullet or enumeration, usually copied
/// from a PDF file.
pub struct TextInItemizeShouldntStartWithItemizeCharacter;

impl Mistake for TextInItemizeShouldntStartWithItemizeCharacter {
    fn name(&self) -> &'static str {
        "text_in_itemize_shouldnt_start_with_itemize_character"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Paragraphs
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        static ITEM: OnceLock<Regex> = OnceLock::new();
        static NESTED: OnceLock<Regex> = OnceLock::new();
        let MistakeInput::Paragraphs(paragraphs) = input else {
            return None;
        };
        let item = ITEM.get_or_init(|| Regex::new(r"^\s*(?:[-*+]|\d+\.)\s+(.*)$").unwrap());
        let nested = NESTED.get_or_init(|| Regex::new(r"^(?:[-*+]|\d+\.)\s").unwrap());
        for (start, lines) in paragraphs.iter() {
            for (offset, line) in lines.iter().enumerate() {
                if is_rule(line) {
                    continue;
                }
                let Some(caps) = item.captures(line) else {
                    continue;
                };
                if nested.is_match(&caps[1]) {
                    return Some(ErrorMessage::at_line(
                        "Der Text eines Aufzählungspunktes beginnt mit einem weiteren \
                         Aufzählungszeichen. Wahrscheinlich wurde der Text aus einer PDF-Datei \
                         kopiert und das ursprüngliche Aufzählungszeichen sollte entfernt werden.",
                        start + offset,
                    ));
                }
            }
        }
        None
    }
}

/// Words hyphenated for justified text, e.g. "al-\ngorithm".
pub struct HyphensFromJustifiedTextWereRemoved;

impl Mistake for HyphensFromJustifiedTextWereRemoved {
    fn name(&self) -> &'static str {
        "hyphens_from_justified_text_were_removed"
    }

    fn mistake_type(&self) -> MistakeType {
        MistakeType::Paragraphs
    }

    fn check(&self, input: &MistakeInput<'_>) -> Option<ErrorMessage> {
        let MistakeInput::Paragraphs(paragraphs) = input else {
            return None;
        };
        let is_table = |line: &String| {
            let line = line.trim();
            line.starts_with(['+', '|']) || line.starts_with("---")
        };
        for (start, lines) in paragraphs.iter() {
            if lines.iter().any(is_table) {
                continue;
            }
            for (offset, pair) in lines.windows(2).enumerate() {
                let current = pair[0].trim_end();
                let Some(word) = current.strip_suffix('-') else {
                    continue;
                };
                if !word.chars().last().is_some_and(char::is_alphabetic) {
                    continue;
                }
                let next_word: String = pair[1]
                    .trim_start()
                    .chars()
                    .take_while(|c| c.is_alphabetic())
                    .collect();
                let continues_word = next_word.chars().next().is_some_and(char::is_lowercase);
                if continues_word && !["and", "und", "or", "oder"].contains(&next_word.as_str()) {
                    return Some(ErrorMessage::at_line(
                        "Diese Zeile endet mit einem Bindestrich und die nächste Zeile beginnt \
                         mit einem Kleinbuchstaben. Wahrscheinlich wurde beim Kopieren aus einer \
                         PDF-Datei eine Silbentrennung übernommen, die entfernt werden sollte.",
                        start + offset,
                    ));
                }
            }
        }
        None
    }
}

/// Image syntax with missing brackets or parentheses.
pub struct BrokenImageLinksAreDetected;

impl BrokenImageLinksAreDetected {
    fn is_broken(line: &str) -> bool {
        static MISSING_OPEN: OnceLock<Regex> = OnceLock::new();
        let missing_open =
            MISSING_OPEN.get_or_init(|| Regex::new(r"![^\[\]\s!][^\[\]]*\]\(").unwrap());
        if missing_open.is_match(line) {
            return true;
        }
        let mut rest = line;
        while let Some(idx) = rest.find("![") {
            let after = &rest[idx + 2..];
            let Some(close) = after.find(']') else {
                return true;
            };
            let tail = &after[close + 1..];
            match tail.chars().next() {
                Some('(') => {
                    if !tail.contains(')') {
                        return true;
                    }
                }
                Some('[') => {}
                _ => {
                    let stray_paren = tail.find(')').is_some_and(|p| !tail[..p].contains('('));
                    if stray_paren {
                        return true;
                    }
                }
            }
            rest = after;
        }
        false
    }
}

impl Mistake for BrokenImageLinksAreDetected {
    fn name(&self) -> &'static str {
        "broken_image_links_are_detected"
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
        Self::is_broken(line).then(|| {
            ErrorMessage::at_line(
                "Ein Bild ist nicht korrekt eingebunden. Die Syntax lautet \
                 ![Bildbeschreibung](Pfad/zum/Bild.jpg), wahrscheinlich fehlt eine Klammer.",
                *lineno,
            )
        })
    }
}
