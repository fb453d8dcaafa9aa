//! HTML output through Pandoc, with formulas rendered by GladTeX or MathJax.

use super::filters::{
    apply_filters, get_title, has_math, html_link_converter, page_number_extractor,
    suppress_captions, Filter,
};
use super::process::execute;
use super::{ConversionProfile, ConvertContext, OutputGenerator};
use crate::config::{LectureMetaData, MetaInfo, Translate};
use crate::error::{Error, Result};
use crate::filesystem::valid_file_bgn;
use crate::model::{extract_chapter_number, FileCache, PageNumber};
use crate::parser::{extract_page_numbers_from_par, file2paragraphs, parse_formulas, rm_codeblocks};
use log::{debug, warn};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Pandoc template. `{Key}` placeholders are filled from the lecture
/// configuration, `$var$` ones by Pandoc.
const HTML_TEMPLATE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml"$if(lang)$ lang="$lang$" xml:lang="$lang$"$endif$>
<head>
  <meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
  <meta name="author" content="{SourceAuthor}" />
$if(date-meta)$
  <meta name="date" content="$date-meta$" />
$endif$
  <title>$if(title-prefix)$$title-prefix$ - $endif$$pagetitle$</title>
  <style type="text/css">
    code { white-space: pre; }
    .underline { text-decoration: underline }
    .annotation { border:2px solid #000000; background-color: #FCFCFC; }
    .annotation:before { content: "{annotation}: "; }
    table, th, td { border:1px solid #000000; }
    /* frames with their colours */
    .frame { border:1px solid #000000; }
    .box { border:2px dotted #000000; }
    {frames}
    {boxes}
    div.frame span.title:before { content: "\A{title}: "; white-space:pre; }
    div.frame span.title:after { content: "\A"; white-space:pre; }
    div.box span.title:before { content: "\A{title}: "; white-space:pre; }
    div.box span.title:after { content: "\A"; white-space:pre; }

$if(highlighting-css)$
$highlighting-css$
$endif$
  </style>
$if(math)$
  $math$
$endif$
$for(header-includes)$
  $header-includes$
$endfor$
  <meta name='Einrichtung' content='{Institution}' />
  <meta name='Arbeitsgruppe' content='{WorkingGroup}' />
  <meta name='Vorlagedokument' content='{Source}' />
  <meta name='Lehrgebiet' content='{LectureTitle}' />
  <meta name='Semester der Bearbeitung' content='{SemesterOfEdit}' />
  <meta name='Bearbeiter' content='{Editor}' />
</head>
<body lang="{Language}">
$for(include-before)$
$include-before$
$endfor$
$if(toc)$
<div id="$idprefix$TOC">
$toc$
</div>
$endif$
$body$
$for(include-after)$
$include-after$
$endfor$
</body>
</html>
"#;

const COLOURS: [(&str, &str); 9] = [
    ("black", "#000000"),
    ("blue", "#0000FF"),
    ("brown", "#A52A2A"),
    ("grey", "#A9A9A9"),
    ("green", "#006400"),
    ("orange", "#FF8C00"),
    ("red", "#FF0000"),
    ("violet", "#8A2BE2"),
    ("yellow", "#FFFF00"),
];

const CONTENT_FILTERS: [Filter; 3] = [page_number_extractor, html_link_converter, suppress_captions];

/// Directory GladTeX writes formula images to.
const FORMULA_IMAGE_DIR: &str = "bilder";

fn start_with_caps(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn title_case(text: &str) -> String {
    text.split(' ').map(start_with_caps).collect::<Vec<_>>().join(" ")
}

/// Configured gap between linked page numbers, a positive number.
fn page_numbering_gap(conf: &LectureMetaData) -> Result<u32> {
    let gap = conf.get_number(MetaInfo::PageNumberingGap)?;
    match u32::try_from(gap) {
        Ok(gap) if gap > 0 => Ok(gap),
        _ => Err(Error::configuration(
            format!(
                "{} must be between 1 and {}, found {}",
                MetaInfo::PageNumberingGap,
                u32::MAX,
                gap
            ),
            Some(conf.path()),
        )),
    }
}

/// Configuration values by key name, as used in the template.
pub fn template_values(conf: &LectureMetaData) -> HashMap<String, String> {
    conf.items()
        .map(|(key, value)| (key.name().to_string(), value.to_string()))
        .collect()
}

/// Converts MarkDown chapters to HTML.
#[derive(Debug, Default)]
pub struct HtmlConverter;

impl HtmlConverter {
    pub fn new() -> Self {
        Self
    }

    /// Fill the template with the given configuration values. A missing
    /// value is reported as configuration error for `conf_path`.
    pub fn get_template(
        values: &HashMap<String, String>,
        language: &str,
        conf_path: Option<&Path>,
    ) -> Result<String> {
        static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
        let placeholder = PLACEHOLDER.get_or_init(|| Regex::new(r"\{([A-Za-z]+)\}").unwrap());
        let t = Translate::new(language);

        let mut frames = vec![
            format!(".frame:before {{ content: \"{}: \"; }}", start_with_caps(&t.get("frame"))),
            format!(".frame:after {{ content: \"\\A {}\"; }}", start_with_caps(&t.get("end of frame"))),
        ];
        let mut boxes = vec![
            format!(".box:before {{ content: \"{}: \"; }}", t.get("box")),
            format!(".box:after {{ content: \"\\A {}\"; }}", start_with_caps(&t.get("end of box"))),
        ];
        for (name, rgb) in COLOURS {
            frames.push(format!(".frame.{} {{ border-color: {}; }}", name, rgb));
            frames.push(format!(
                ".frame.{}:before {{ content: \"{}: \"; }}",
                name,
                start_with_caps(&t.get(&format!("{} frame", name)))
            ));
            boxes.push(format!(".box.{} {{ border-color: {}; }}", name, rgb));
            boxes.push(format!(
                ".box.{}:before {{ content: \"{}: \"; }}",
                name,
                t.get(&format!("{} box", name))
            ));
        }
        let generated: HashMap<&str, String> = HashMap::from([
            ("annotation", start_with_caps(&t.get("note of editor"))),
            ("frames", frames.join("\n    ")),
            ("boxes", boxes.join("\n    ")),
            ("title", t.get("title")),
        ]);

        let mut missing = None;
        let template = placeholder.replace_all(HTML_TEMPLATE, |caps: &regex::Captures<'_>| {
            let key = &caps[1];
            match generated.get(key).or_else(|| values.get(key)) {
                Some(value) => value.clone(),
                None => {
                    missing.get_or_insert_with(|| key.to_string());
                    String::new()
                }
            }
        });
        match missing {
            Some(key) => Err(Error::configuration(
                format!("The key {} is missing in the configuration.", key),
                conf_path,
            )),
            None => Ok(template.into_owned()),
        }
    }

    /// Navigation bars for the start and the end of a chapter: links to the
    /// previous and next chapter, the table of contents and every n-th page,
    /// with n being the configured page numbering gap.
    pub fn generate_page_navigation(
        &self,
        path: &Path,
        cache: &FileCache,
        page_numbers: &[PageNumber],
        conf: &LectureMetaData,
    ) -> Result<(String, String)> {
        if !path.exists() {
            return Err(Error::structural("File doesn't exist", path));
        }
        let t = Translate::new(conf.get(MetaInfo::Language));
        let ext = self.file_extension();
        let (previous, next) = cache.get_neighbours_for(path)?;
        let make_link = |label: &str, (dir, file): &(PathBuf, String)| {
            let dir = dir
                .file_name()
                .map(|d| d.to_string_lossy().into_owned())
                .unwrap_or_default();
            let file = Path::new(file).with_extension(ext);
            format!("[{}](../{}/{})", title_case(&t.get(label)), dir, file.display())
        };

        let gap = page_numbering_gap(conf)?;
        let pages: Vec<String> = page_numbers
            .iter()
            .filter(|p| {
                let (first, last) = (p.number.first(), p.number.last());
                first <= last && last / gap * gap >= first
            })
            .map(|p| format!("[[{}]](#{})", p.display_number(), p.anchor_id()))
            .collect();
        let navbar = if pages.is_empty() {
            String::new()
        } else {
            format!("{}: {}", title_case(&t.get("pages")), pages.join(", "))
        };

        let mut chapter_nav = vec![format!(
            "[{}](../inhalt.{})",
            title_case(&t.get("table of contents")),
            ext
        )];
        if let Some(previous) = previous {
            chapter_nav.insert(0, make_link("previous", previous));
        }
        if let Some(next) = next {
            chapter_nav.push(make_link("next", next));
        }
        let chapter_nav = chapter_nav.join("  ");
        let start = format!("{}\n\n{}\n\n* * * *\n\n\n", chapter_nav, navbar);
        let end = format!("\n\n* * * *\n\n{}\n\n{}\n", navbar, chapter_nav);
        Ok((start, end))
    }

    fn write_template(&self, conf: &LectureMetaData) -> Result<tempfile::NamedTempFile> {
        let template = Self::get_template(
            &template_values(conf),
            conf.get(MetaInfo::Language),
            Some(conf.path()),
        )?;
        let mut file = tempfile::Builder::new().suffix(".html").tempfile()?;
        file.write_all(template.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    /// Turn a GladTeX failure into a [`Error::Math`] pointing to the formula
    /// in the MarkDown source.
    fn handle_gladtex_error(&self, error: Error, source: &Path) -> Error {
        let Error::Subprocess { command, message, .. } = &error else {
            return error;
        };
        let details: HashMap<&str, &str> = message
            .lines()
            .filter_map(|line| line.split_once(": "))
            .map(|(k, v)| (k.trim(), v.trim()))
            .collect();
        let (Some(number), Some(latex_message)) = (
            details.get("Number").and_then(|n| n.parse::<usize>().ok()),
            details.get("Message"),
        ) else {
            return error;
        };
        let formulas = match fs::read_to_string(source) {
            Ok(text) => parse_formulas(&rm_codeblocks(&file2paragraphs(&text, false))),
            Err(e) => return e.into(),
        };
        match number.checked_sub(1).and_then(|idx| formulas.iter().nth(idx)) {
            Some((&(line, pos), formula)) => Error::Math {
                message: format!("formula: {}\n{}", formula, latex_message),
                formula_count: number,
                path: Some(source.to_path_buf()),
                line: Some(line),
                pos: Some(pos),
            },
            None => Error::Subprocess {
                command: command.clone(),
                message: "LaTeX reported an error while converting a formula. Unfortunately, \
                          improperly closed maths environments exist, therefore it cannot be \
                          determined which formula was erroneous. Please re-read the document \
                          and fix any unclosed maths environments."
                    .into(),
                path: Some(source.to_path_buf()),
            },
        }
    }
}

impl OutputGenerator for HtmlConverter {
    fn format_name(&self) -> &str {
        "html"
    }

    fn file_extension(&self) -> &str {
        "html"
    }

    fn convert(&self, path: &Path, ctx: &ConvertContext<'_>) -> Result<Option<PathBuf>> {
        if !ctx.force && !self.needs_update(path) {
            debug!("{} is up to date", path.display());
            return Ok(None);
        }
        let mut document = fs::read_to_string(path)?;
        if document.trim().is_empty() {
            return Ok(None);
        }
        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        if valid_file_bgn(&file_name) && ctx.cache.contains(&file_name) {
            let page_numbers =
                extract_page_numbers_from_par(&file2paragraphs(&document, false), None);
            let (start, end) = self
                .generate_page_navigation(path, ctx.cache, &page_numbers, ctx.conf)
                .map_err(|e| e.with_path(path))?;
            document = format!("{}\n\n{}\n\n{}\n", start, document, end);
        }

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let ast = execute(&["pandoc", "-f", "markdown", "-t", "json"], Some(document.as_str()), Some(dir))?;
        let mut ast: serde_json::Value = serde_json::from_str(&ast)?;
        apply_filters(&mut ast, &CONTENT_FILTERS);

        let template = self.write_template(ctx.conf)?;
        let mut args = vec![
            "pandoc".to_string(),
            "-s".into(),
            format!("--template={}", template.path().display()),
        ];
        if let Some(title) = get_title(&ast) {
            args.extend(["-V".into(), format!("pagetitle:{}", title)]);
            args.extend(["-V".into(), format!("title:{}", title)]);
        }
        if ctx.conf.get_bool(MetaInfo::AutoNumberingOfChapter) {
            if let Ok(chapter) = extract_chapter_number(path) {
                args.extend([
                    "--number-sections".into(),
                    "--number-offset".into(),
                    (chapter - 1).to_string(),
                ]);
            }
        }
        let stem = Path::new(&file_name).with_extension("");
        let use_gladtex = ctx.profile == ConversionProfile::Blind && has_math(&ast);
        let output = if use_gladtex {
            args.push("--gladtex".into());
            stem.with_extension("htex")
        } else {
            if ctx.profile == ConversionProfile::VisuallyImpaired {
                args.push("--mathjax".into());
            }
            stem.with_extension(self.file_extension())
        };
        args.extend(["-t".into(), "html".into(), "-f".into(), "json".into()]);
        args.extend(["-o".into(), output.display().to_string()]);
        let ast = serde_json::to_string(&ast)?;
        execute(&args, Some(ast.as_str()), Some(dir))?;

        if use_gladtex {
            let mut gladtex: Vec<String> = ["gladtex", "-R", "-n", "-m"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            let options = ctx.conf.get(MetaInfo::GladTexOpts);
            if options.trim().is_empty() {
                gladtex.extend(["-a", "-d", FORMULA_IMAGE_DIR].map(String::from));
            } else {
                gladtex.extend(options.split_whitespace().map(String::from));
            }
            gladtex.push(output.display().to_string());
            let result = execute(&gladtex, None, Some(dir));
            let htex = dir.join(&output);
            if htex.exists() {
                if let Err(e) = fs::remove_file(&htex) {
                    warn!("could not remove {}: {}", htex.display(), e);
                }
            }
            result.map_err(|e| self.handle_gladtex_error(e, path))?;
        }
        Ok(Some(self.output_path(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONF_FILE_NAME;
    use crate::model::PageValue;
    use tempfile::TempDir;

    fn meta() -> HashMap<String, String> {
        [
            ("Editor", "unique1"),
            ("SourceAuthor", "dummy"),
            ("WorkingGroup", "unique2"),
            ("Institution", "unique3"),
            ("Source", "unique4"),
            ("LectureTitle", "unique5"),
            ("SemesterOfEdit", "unique1990"),
            ("Language", "de"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    struct Lecture {
        dir: TempDir,
        cache: FileCache,
        conf: LectureMetaData,
    }

    fn lecture(language: &str, gap: usize) -> Lecture {
        let dir = TempDir::new().unwrap();
        for chapter in ["anh01", "v01", "k01"] {
            fs::create_dir(dir.path().join(chapter)).unwrap();
            fs::write(dir.path().join(chapter).join(format!("{}.md", chapter)), "\n").unwrap();
        }
        let entries = vec![
            (dir.path().to_path_buf(), vec!["anh01".into(), "v01".into(), "k01".into()], vec![]),
            (dir.path().join("anh01"), vec![], vec!["anh01.md".to_string()]),
            (dir.path().join("k01"), vec![], vec!["k01.md".to_string()]),
            (dir.path().join("v01"), vec![], vec!["v01.md".to_string()]),
        ];
        let cache = FileCache::new(entries).unwrap();
        let mut conf = LectureMetaData::new(dir.path().join(CONF_FILE_NAME));
        conf.set(MetaInfo::Language, language);
        conf.set(MetaInfo::PageNumberingGap, gap.to_string());
        Lecture { dir, cache, conf }
    }

    fn pages(arabic: bool) -> Vec<PageNumber> {
        (1..50)
            .map(|i| PageNumber::new("Seite", i).with_arabic(arabic))
            .collect()
    }

    fn nav(lecture: &Lecture, file: &str, pnums: &[PageNumber]) -> String {
        let (start, end) = HtmlConverter::new()
            .generate_page_navigation(&lecture.dir.path().join(file), &lecture.cache, pnums, &lecture.conf)
            .unwrap();
        start + &end
    }

    #[test]
    fn test_css_information_is_in_template() {
        let template = HtmlConverter::get_template(&meta(), "de", None).unwrap();
        assert!(template.contains(".underline"));
        assert!(template.contains(".frame"));
        assert!(template.contains("Rahmenende"));
        assert!(template.contains(".frame.red:before { content: \"Roter Rahmen: \"; }"));
    }

    #[test]
    fn test_all_meta_data_is_in_template() {
        let template = HtmlConverter::get_template(&meta(), "de", None).unwrap();
        for (key, value) in meta() {
            if key == "Language" {
                continue;
            }
            assert!(template.contains(&value), "{} ({}) missing", value, key);
        }
        assert!(template.contains("<body lang=\"de\">"));
        assert!(template.contains("$pagetitle$"));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let mut values = meta();
        values.remove("SourceAuthor");
        let err = HtmlConverter::get_template(&values, "de", Some(Path::new("x.dcxml"))).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.message().contains("SourceAuthor"));
    }

    #[test]
    fn test_template_from_configuration() {
        let conf = LectureMetaData::new(CONF_FILE_NAME);
        assert!(HtmlConverter::get_template(&template_values(&conf), "en", None).is_ok());
    }

    #[test]
    fn test_navbar_is_generated() {
        let lecture = lecture("de", 5);
        let (start, end) = HtmlConverter::new()
            .generate_page_navigation(
                &lecture.dir.path().join("k01/k01.md"),
                &lecture.cache,
                &pages(true),
                &lecture.conf,
            )
            .unwrap();
        assert!(start.contains("[Inhalt](../inhalt.html)"));
        assert!(start.contains("[Vorherige](../v01/v01.html)"));
        assert!(start.contains("[Nächste](../anh01/anh01.html)"));
        assert!(end.contains("[[5]](#p5)"));
    }

    #[test]
    fn test_page_number_gap_is_used() {
        let lecture = lecture("de", 10);
        let nav = nav(&lecture, "k01/k01.md", &pages(true));
        assert!(!nav.contains("[5]"));
        assert!(nav.contains("[10]"));
    }

    #[test]
    fn test_invalid_page_number_gap() {
        for gap in ["0", "4294967296", "fünf"] {
            let mut lecture = lecture("de", 5);
            lecture.conf.set(MetaInfo::PageNumberingGap, gap);
            let err = HtmlConverter::new()
                .generate_page_navigation(
                    &lecture.dir.path().join("k01/k01.md"),
                    &lecture.cache,
                    &pages(true),
                    &lecture.conf,
                )
                .unwrap_err();
            assert!(matches!(err, Error::Configuration { .. }), "{}: {}", gap, err);
        }
    }

    #[test]
    fn test_ranges_are_linked_if_they_contain_a_multiple() {
        let lecture = lecture("de", 5);
        let range = |start, stop| PageNumber::new("Seite", PageValue::Range { start, stop });
        let pnums = [range(1, 4), range(6, 11), range(9, 7), range(1, 4_000_000_000)];
        let nav = nav(&lecture, "k01/k01.md", &pnums);
        assert!(!nav.contains("[[1-4]]"));
        assert!(nav.contains("[[6-11]]"));
        assert!(!nav.contains("[[9-7]]"));
        assert!(nav.contains("[[1-4000000000]]"));
    }

    #[test]
    fn test_roman_numbers() {
        let lecture = lecture("de", 5);
        let nav = nav(&lecture, "k01/k01.md", &pages(false));
        assert!(nav.contains("[[V]](#pV)"));
    }

    #[test]
    fn test_language_is_used() {
        let lecture = lecture("en", 5);
        let nav = nav(&lecture, "k01/k01.md", &pages(true)).to_lowercase();
        assert!(!nav.contains("nhalt]"));
        assert!(nav.contains("table of contents]"));
    }

    #[test]
    fn test_link_to_missing_next_file_is_omitted() {
        let lecture = lecture("de", 5);
        let nav = nav(&lecture, "anh01/anh01.md", &pages(true));
        assert!(nav.contains("k01/k01.html"));
        let chapter_line = nav.lines().next().unwrap();
        assert!(chapter_line.ends_with("inhalt.html)"), "{}", chapter_line);
    }

    #[test]
    fn test_unknown_file_has_no_navigation() {
        let lecture = lecture("de", 5);
        fs::write(lecture.dir.path().join("k01/k02.md"), "\n").unwrap();
        let result = HtmlConverter::new().generate_page_navigation(
            &lecture.dir.path().join("k01/k02.md"),
            &lecture.cache,
            &[],
            &lecture.conf,
        );
        assert!(matches!(result, Err(Error::Structural { .. })));
    }

    #[test]
    fn test_gladtex_error_points_to_formula() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("k01.md");
        fs::write(&source, "Text $a$ und\n\n$$\\foo$$\n").unwrap();
        let error = Error::Subprocess {
            command: "gladtex".into(),
            message: "Number: 2\nMessage: Undefined control sequence".into(),
            path: None,
        };
        match HtmlConverter::new().handle_gladtex_error(error, &source) {
            Error::Math { formula_count, line, pos, message, path, .. } => {
                assert_eq!(formula_count, 2);
                assert_eq!(line, Some(3));
                assert_eq!(pos, Some(1));
                assert!(message.contains("Undefined control sequence"));
                assert_eq!(path, Some(PathBuf::from(&source)));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_up_to_date_output_is_skipped() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("k01.md");
        fs::write(&source, "# Titel\n").unwrap();
        let converter = HtmlConverter::new();
        assert!(converter.needs_update(&source));
        std::thread::sleep(std::time::Duration::from_millis(20));
        fs::write(dir.path().join("k01.html"), "<html/>").unwrap();
        assert!(!converter.needs_update(&source));
    }
}
