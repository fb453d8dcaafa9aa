//! Reading and writing `.lecture_meta_data.dcxml`.

use super::CONF_FILE_NAME;
use crate::error::{Error, Result};
use chrono::{Datelike, Local, NaiveDate};
use log::{debug, warn};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use semver::Version;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1";
const MAGSBS_NAMESPACE: &str = "http://elvis.inf.tu-dresden.de";

/// Configuration keys of a lecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaInfo {
    Editor,
    SourceAuthor,
    WorkingGroup,
    Institution,
    Source,
    LectureTitle,
    SemesterOfEdit,
    Language,
    Format,
    TocDepth,
    PageNumberingGap,
    GenerateToc,
    AppendixPrefix,
    AutoNumberingOfChapter,
    GladTexOpts,
}

impl MetaInfo {
    /// All keys in the order they are written.
    pub const ALL: [MetaInfo; 15] = [
        MetaInfo::Editor,
        MetaInfo::SourceAuthor,
        MetaInfo::WorkingGroup,
        MetaInfo::Institution,
        MetaInfo::Source,
        MetaInfo::LectureTitle,
        MetaInfo::SemesterOfEdit,
        MetaInfo::Language,
        MetaInfo::Format,
        MetaInfo::TocDepth,
        MetaInfo::PageNumberingGap,
        MetaInfo::GenerateToc,
        MetaInfo::AppendixPrefix,
        MetaInfo::AutoNumberingOfChapter,
        MetaInfo::GladTexOpts,
    ];

    /// Name used in templates and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            MetaInfo::Editor => "Editor",
            MetaInfo::SourceAuthor => "SourceAuthor",
            MetaInfo::WorkingGroup => "WorkingGroup",
            MetaInfo::Institution => "Institution",
            MetaInfo::Source => "Source",
            MetaInfo::LectureTitle => "LectureTitle",
            MetaInfo::SemesterOfEdit => "SemesterOfEdit",
            MetaInfo::Language => "Language",
            MetaInfo::Format => "Format",
            MetaInfo::TocDepth => "TocDepth",
            MetaInfo::PageNumberingGap => "PageNumberingGap",
            MetaInfo::GenerateToc => "GenerateToc",
            MetaInfo::AppendixPrefix => "AppendixPrefix",
            MetaInfo::AutoNumberingOfChapter => "AutoNumberingOfChapter",
            MetaInfo::GladTexOpts => "GladTexOpts",
        }
    }

    /// Qualified XML tag in the configuration file.
    pub fn tag(&self) -> &'static str {
        match self {
            MetaInfo::Editor => "dc:contributor",
            MetaInfo::SourceAuthor => "dc:creator",
            MetaInfo::WorkingGroup => "MAGSBS:workingGroup",
            MetaInfo::Institution => "dc:publisher",
            MetaInfo::Source => "dc:source",
            MetaInfo::LectureTitle => "dc:title",
            MetaInfo::SemesterOfEdit => "MAGSBS:semesterOfEdit",
            MetaInfo::Language => "dc:language",
            MetaInfo::Format => "MAGSBS:format",
            MetaInfo::TocDepth => "MAGSBS:tocDepth",
            MetaInfo::PageNumberingGap => "MAGSBS:pageNumberingGap",
            MetaInfo::GenerateToc => "MAGSBS:generateToc",
            MetaInfo::AppendixPrefix => "MAGSBS:appendixPrefix",
            MetaInfo::AutoNumberingOfChapter => "MAGSBS:autoNumberingOfChapter",
            MetaInfo::GladTexOpts => "MAGSBS:gladtexOpts",
        }
    }

    fn from_local_tag(local: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.tag().rsplit(':').next() == Some(local))
    }
}

impl fmt::Display for MetaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MetaInfo {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|key| key.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::configuration(format!("unknown key: {}", s), None))
    }
}

/// Semester for the given day: `WS yy/yy+1` from October to March (January
/// to March belong to the winter semester of the previous year), `SS yy`
/// otherwise.
pub fn semester_for(date: NaiveDate) -> String {
    let month = date.month();
    if (4..=10).contains(&month) {
        format!("SS {:02}", date.year() % 100)
    } else {
        let year = if month < 4 { date.year() - 1 } else { date.year() };
        format!("WS {:02}/{:02}", year % 100, (year + 1) % 100)
    }
}

/// Current semester.
pub fn get_semester() -> String {
    semester_for(Local::now().date_naive())
}

fn login_name() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "Unknown".to_string())
}

/// Parse a version, padding `0.9` to `0.9.0`.
fn parse_version(s: &str) -> Option<Version> {
    let s = s.trim();
    let padded = match s.matches('.').count() {
        0 => format!("{}.0.0", s),
        1 => format!("{}.0", s),
        _ => s.to_string(),
    };
    Version::parse(&padded).ok()
}

/// Version of this program as written to configuration files.
pub fn program_version() -> Version {
    parse_version(env!("CARGO_PKG_VERSION")).unwrap_or_else(|| Version::new(0, 0, 0))
}

/// Metadata of a lecture.
///
/// Values are kept as strings, typed accessors interpret them.
#[derive(Debug, Clone)]
pub struct LectureMetaData {
    path: PathBuf,
    version: Version,
    values: BTreeMap<MetaInfo, String>,
    warnings: Vec<String>,
}

impl LectureMetaData {
    /// Create a configuration with default values for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_version(path, program_version())
    }

    /// Create a configuration for a specific program version.
    pub fn with_version(path: impl Into<PathBuf>, version: Version) -> Self {
        let values = [
            (MetaInfo::Editor, login_name()),
            (MetaInfo::SourceAuthor, "Unknown".to_string()),
            (MetaInfo::WorkingGroup, "AGSBS".to_string()),
            (MetaInfo::Institution, "TU Dresden".to_string()),
            (MetaInfo::Source, "Unknown".to_string()),
            (MetaInfo::LectureTitle, "Unknown".to_string()),
            (MetaInfo::SemesterOfEdit, get_semester()),
            (MetaInfo::Language, "de".to_string()),
            (MetaInfo::Format, "html".to_string()),
            (MetaInfo::TocDepth, "5".to_string()),
            (MetaInfo::PageNumberingGap, "5".to_string()),
            (MetaInfo::GenerateToc, "1".to_string()),
            (MetaInfo::AppendixPrefix, "0".to_string()),
            (MetaInfo::AutoNumberingOfChapter, "0".to_string()),
            (MetaInfo::GladTexOpts, "-a -d bilder".to_string()),
        ]
        .into_iter()
        .collect();
        Self {
            path: path.into(),
            version,
            values,
            warnings: Vec::new(),
        }
    }

    /// Path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Warnings collected while reading, e.g. about newer bug fix versions.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get a value.
    pub fn get(&self, key: MetaInfo) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }

    /// Set a value.
    pub fn set(&mut self, key: MetaInfo, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    /// Get a numeric value; invalid numbers are a configuration error.
    pub fn get_number(&self, key: MetaInfo) -> Result<usize> {
        self.get(key).trim().parse().map_err(|_| {
            Error::configuration(
                format!("{} must be a number, found \"{}\"", key, self.get(key)),
                Some(&self.path),
            )
        })
    }

    /// Get a boolean value; `1`, `true` and `yes` are true.
    pub fn get_bool(&self, key: MetaInfo) -> bool {
        matches!(
            self.get(key).trim().to_lowercase().as_str(),
            "1" | "true" | "yes"
        )
    }

    /// Iterate over all key-value pairs.
    pub fn items(&self) -> impl Iterator<Item = (MetaInfo, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Read the configuration file, checking its version.
    ///
    /// Files of an older minor version are upgraded in place, files of a
    /// newer minor version are rejected.
    pub fn read(&mut self) -> Result<()> {
        let content = fs::read_to_string(&self.path)?;
        let (values, file_version) = parse_document(&content)
            .map_err(|e| e.with_path(&self.path))?;
        for (key, value) in values {
            self.values.insert(key, value);
        }

        let file_version = file_version.unwrap_or_else(|| "0.0".to_string());
        let parsed = parse_version(&file_version).ok_or_else(|| {
            Error::configuration(
                format!("cannot parse version number \"{}\"", file_version),
                Some(&self.path),
            )
        })?;
        let file_release = (parsed.major, parsed.minor);
        let own_release = (self.version.major, self.version.minor);
        if file_release > own_release {
            return Err(Error::configuration(
                format!(
                    "the configuration was written by version {}, this program has version {}; please upgrade",
                    parsed, self.version
                ),
                Some(&self.path),
            ));
        } else if file_release < own_release {
            debug!(
                "upgrading configuration {} from {} to {}",
                self.path.display(),
                parsed,
                self.version
            );
            self.write()?;
        } else if parsed.patch > self.version.patch {
            let message = format!(
                "{}: the configuration was written by the newer bug fix release {}, this program has version {}",
                self.path.display(),
                parsed,
                self.version
            );
            warn!("{}", message);
            self.warnings.push(message);
        }
        Ok(())
    }

    /// Write the configuration file.
    pub fn write(&self) -> Result<()> {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str(&format!(
            "<metadata xmlns:dc=\"{}\" xmlns:MAGSBS=\"{}\">\n",
            DC_NAMESPACE, MAGSBS_NAMESPACE
        ));
        for key in MetaInfo::ALL {
            out.push_str(&format!(
                "  <{tag}>{value}</{tag}>\n",
                tag = key.tag(),
                value = quick_xml::escape::escape(self.get(key))
            ));
        }
        out.push_str(&format!(
            "  <MAGSBS:version>{}</MAGSBS:version>\n",
            self.version
        ));
        out.push_str("</metadata>\n");
        fs::write(&self.path, out)?;
        Ok(())
    }
}

impl Serialize for LectureMetaData {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key.name(), value)?;
        }
        map.end()
    }
}

fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

fn resolve_entity(entity: &str) -> Option<String> {
    if let Some(predefined) = resolve_predefined_entity(entity) {
        return Some(predefined.to_string());
    }
    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse().ok()
    } else {
        None
    };
    code.and_then(char::from_u32).map(String::from)
}

/// Parse the configuration XML into its key-value pairs and version.
fn parse_document(content: &str) -> Result<(Vec<(MetaInfo, String)>, Option<String>)> {
    // text is split at entity references, so it is only trimmed once complete
    let mut reader = Reader::from_str(content);

    let mut values = Vec::new();
    let mut version = None;
    let mut current: Option<String> = None;
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.name();
                current = Some(String::from_utf8_lossy(local_name(name.as_ref())).into_owned());
                text.clear();
            }
            Event::Text(e) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Event::GeneralRef(e) => {
                if current.is_some() {
                    if let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref())) {
                        text.push_str(&resolved);
                    }
                }
            }
            Event::End(_) => {
                if let Some(local) = current.take() {
                    if local == "version" {
                        version = Some(text.trim().to_string());
                    } else if let Some(key) = MetaInfo::from_local_tag(&local) {
                        values.push((key, text.trim().to_string()));
                    }
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok((values, version))
}

/// Values stored in a configuration file, in file order. Unlike
/// [`LectureMetaData::read`], neither defaults nor version checks apply.
pub fn read_stored_values(path: impl AsRef<Path>) -> Result<Vec<(MetaInfo, String)>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let (values, _) = parse_document(&content).map_err(|e| e.with_path(path))?;
    Ok(values)
}

/// Line number (1-based) of the first occurrence of `tag` in a file.
pub fn get_lnum_of_tag(path: impl AsRef<Path>, tag: &str) -> Result<Option<usize>> {
    let content = fs::read_to_string(path)?;
    let needle = format!("<{}", tag);
    Ok(content
        .lines()
        .position(|line| {
            line.find(&needle).is_some_and(|i| {
                matches!(line[i + needle.len()..].chars().next(), Some('>' | ' ' | '/'))
            })
        })
        .map(|i| i + 1))
}

/// Locates the configuration that applies to a path.
#[derive(Debug, Default)]
pub struct ConfFactory;

impl ConfFactory {
    /// Create a new factory.
    pub fn new() -> Self {
        Self
    }

    /// Find and read the configuration for `path`.
    ///
    /// The directory of `path` and its parents are searched up to the
    /// lecture root. If no configuration exists, defaults for a file in the
    /// lecture root (or `path` itself) are returned.
    pub fn get_conf_instance(&self, path: impl AsRef<Path>) -> Result<LectureMetaData> {
        let path = path.as_ref();
        let start = if path.is_file() {
            path.parent().unwrap_or(Path::new("."))
        } else {
            path
        };
        let start = if start.as_os_str().is_empty() {
            Path::new(".")
        } else {
            start
        };
        let start = fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());

        let mut dir = Some(start.as_path());
        while let Some(current) = dir {
            let candidate = current.join(CONF_FILE_NAME);
            if candidate.is_file() {
                let mut conf = LectureMetaData::new(candidate);
                conf.read()?;
                return Ok(conf);
            }
            if crate::filesystem::is_lecture_root(current) {
                break;
            }
            dir = current.parent();
        }

        let root = crate::filesystem::get_lecture_root(&start).unwrap_or(start);
        Ok(LectureMetaData::new(root.join(CONF_FILE_NAME)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn conf(path: &Path, version: &str) -> LectureMetaData {
        LectureMetaData::with_version(path, parse_version(version).unwrap())
    }

    #[test]
    fn test_semester() {
        let d = |y, m| NaiveDate::from_ymd_opt(y, m, 1).unwrap();
        assert_eq!(semester_for(d(2024, 5)), "SS 24");
        assert_eq!(semester_for(d(2024, 10)), "SS 24");
        assert_eq!(semester_for(d(2024, 11)), "WS 24/25");
        assert_eq!(semester_for(d(2025, 2)), "WS 24/25");
        assert_eq!(semester_for(d(2099, 12)), "WS 99/00");
    }

    #[test]
    fn test_version_padding() {
        assert_eq!(parse_version("0.9"), Some(Version::new(0, 9, 0)));
        assert_eq!(parse_version("1"), Some(Version::new(1, 0, 0)));
        assert!(parse_version("6.8~beta.9").is_none());
    }

    #[test]
    fn test_version_is_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo");
        let mut c = conf(&path, "0.9");
        c.set(MetaInfo::SemesterOfEdit, "fake");
        c.write().unwrap();
        let data = fs::read_to_string(&path).unwrap();
        assert!(data.contains("version>0.9.0"));
        assert!(data.contains("<MAGSBS:semesterOfEdit>fake</MAGSBS:semesterOfEdit>"));
    }

    #[test]
    fn test_values_survive_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf");
        let mut c = conf(&path, "0.9");
        c.set(MetaInfo::LectureTitle, "Analysis & <Algebra>");
        c.set(MetaInfo::TocDepth, "2");
        c.write().unwrap();

        let mut read = conf(&path, "0.9");
        read.read().unwrap();
        assert_eq!(read.get(MetaInfo::LectureTitle), "Analysis & <Algebra>");
        assert_eq!(read.get_number(MetaInfo::TocDepth).unwrap(), 2);
    }

    #[test]
    fn test_whitespace_around_escaped_characters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf");
        let mut c = conf(&path, "0.9");
        c.set(MetaInfo::SourceAuthor, "Tom & Jerry's  \"Verlag\" ");
        c.set(MetaInfo::Source, " a < b > c ");
        c.write().unwrap();

        let mut read = conf(&path, "0.9");
        read.read().unwrap();
        assert_eq!(read.get(MetaInfo::SourceAuthor), "Tom & Jerry's  \"Verlag\"");
        assert_eq!(read.get(MetaInfo::Source), "a < b > c");
    }

    #[test]
    fn test_indented_values_are_trimmed() {
        let content = "<metadata>\n  <dc:title>\n    Analysis &amp; Algebra\n  </dc:title>\n</metadata>\n";
        let (values, _) = parse_document(content).unwrap();
        assert_eq!(values, vec![(MetaInfo::LectureTitle, "Analysis & Algebra".to_string())]);
    }

    #[test]
    fn test_character_references() {
        assert_eq!(resolve_entity("amp").as_deref(), Some("&"));
        assert_eq!(resolve_entity("#x41").as_deref(), Some("A"));
        assert_eq!(resolve_entity("#228").as_deref(), Some("ä"));
        assert_eq!(resolve_entity("nbsp"), None);
    }

    #[test]
    fn test_outdated_program_raises() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf");
        conf(&path, "10.9").write().unwrap();
        let result = conf(&path, "0.9").read();
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn test_outdated_configuration_is_upgraded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf");
        conf(&path, "0.9").write().unwrap();
        conf(&path, "20.2").read().unwrap();
        let data = fs::read_to_string(&path).unwrap();
        assert!(data.contains("version>20.2"), "{}", data);
    }

    #[test]
    fn test_bug_fix_releases_are_compatible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf");
        conf(&path, "0.9").write().unwrap();
        assert!(conf(&path, "0.9").read().is_ok());
        let mut c = conf(&path, "0.9.5");
        c.read().unwrap();
        assert!(c.warnings().is_empty());
    }

    #[test]
    fn test_newer_bug_fix_release_warns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf");
        conf(&path, "0.9.5").write().unwrap();
        let mut c = conf(&path, "0.9");
        c.read().unwrap();
        assert_eq!(c.warnings().len(), 1);
    }

    #[test]
    fn test_unparseable_version_raises() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf");
        conf(&path, "6.6.6").write().unwrap();
        let data = fs::read_to_string(&path).unwrap().replace("6.6.6", "6.8~beta.9");
        fs::write(&path, data).unwrap();
        assert!(matches!(
            conf(&path, "6.6.6").read(),
            Err(Error::Configuration { .. })
        ));
    }

    #[test]
    fn test_lnum_of_tag() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("conf");
        conf(&path, "0.9").write().unwrap();
        assert_eq!(get_lnum_of_tag(&path, "dc:contributor").unwrap(), Some(3));
        assert_eq!(get_lnum_of_tag(&path, "dc:nothing").unwrap(), None);
    }

    #[test]
    fn test_meta_info_from_str() {
        assert_eq!("tocdepth".parse::<MetaInfo>().unwrap(), MetaInfo::TocDepth);
        assert!("nonsense".parse::<MetaInfo>().is_err());
    }

    #[test]
    fn test_factory_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("k01")).unwrap();
        let conf = ConfFactory::new()
            .get_conf_instance(dir.path().join("k01"))
            .unwrap();
        assert_eq!(conf.get(MetaInfo::Language), "de");
        assert_eq!(
            conf.path().file_name().unwrap().to_string_lossy(),
            CONF_FILE_NAME
        );
    }

    #[test]
    fn test_factory_finds_configuration_in_parent() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("k01")).unwrap();
        let mut c = LectureMetaData::new(dir.path().join(CONF_FILE_NAME));
        c.set(MetaInfo::Language, "en");
        c.write().unwrap();
        let conf = ConfFactory::new()
            .get_conf_instance(dir.path().join("k01"))
            .unwrap();
        assert_eq!(conf.get(MetaInfo::Language), "en");
    }
}
