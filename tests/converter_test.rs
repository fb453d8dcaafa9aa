//! Integration tests for the converter module.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use matuc::config::{LectureMetaData, MetaInfo, CONF_FILE_NAME};
use matuc::convert::{
    ConversionProfile, ConvertContext, ConvertOptions, ConverterRegistry, OutputGenerator, Pandoc,
};
use matuc::error::Result;
use matuc::InitLecture;
use tempfile::TempDir;

/// Mock generator recording what it was asked to convert.
struct MockGenerator {
    name: &'static str,
    seen: Mutex<Vec<(PathBuf, ConversionProfile, Option<String>, Option<String>)>>,
}

impl MockGenerator {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl OutputGenerator for MockGenerator {
    fn format_name(&self) -> &str {
        self.name
    }

    fn file_extension(&self) -> &str {
        "txt"
    }

    fn convert(&self, path: &Path, ctx: &ConvertContext<'_>) -> Result<Option<PathBuf>> {
        let (previous, next) = ctx.cache.get_neighbours_for(path)?;
        self.seen.lock().unwrap().push((
            path.to_path_buf(),
            ctx.profile,
            previous.map(|(_, f)| f.clone()),
            next.map(|(_, f)| f.clone()),
        ));
        let output = self.output_path(path);
        fs::write(&output, format!("Converted by {}", self.name))?;
        Ok(Some(output))
    }
}

fn lecture(format: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    InitLecture::new(dir.path(), 3, "de").generate_structure().unwrap();
    let mut conf = LectureMetaData::new(dir.path().join(CONF_FILE_NAME));
    conf.read().unwrap();
    conf.set(MetaInfo::Format, format);
    conf.write().unwrap();
    dir
}

#[test]
fn test_convert_options_builder() {
    let options = ConvertOptions::new()
        .with_profile(ConversionProfile::VisuallyImpaired)
        .with_force(true);
    assert_eq!(options.profile, ConversionProfile::VisuallyImpaired);
    assert!(options.force);
}

#[test]
fn test_profile_parsing() {
    assert_eq!("blind".parse::<ConversionProfile>().unwrap(), ConversionProfile::Blind);
    assert_eq!("VID".parse::<ConversionProfile>().unwrap(), ConversionProfile::VisuallyImpaired);
    assert!("braille".parse::<ConversionProfile>().is_err());
}

#[test]
fn test_registry_custom_generator() {
    let mut registry = ConverterRegistry::with_defaults();
    registry.register(Arc::new(MockGenerator::new("mock")));
    assert!(registry.supports("html"));
    assert!(registry.supports("MOCK"));
    assert_eq!(registry.supported_formats(), vec!["html", "mock"]);
}

#[test]
fn test_pandoc_uses_configured_generator() {
    let dir = lecture("mock");
    let generator = Arc::new(MockGenerator::new("mock"));
    let mut registry = ConverterRegistry::new();
    registry.register(generator.clone());

    let files = [dir.path().join("k01/k01.md"), dir.path().join("k02/k02.md")];
    let mut progress = Vec::new();
    let written = Pandoc::new()
        .with_registry(registry)
        .with_profile(ConversionProfile::VisuallyImpaired)
        .convert_files_with_progress(&files, |p| progress.push(p.to_path_buf()))
        .unwrap();

    assert_eq!(written.len(), 2);
    assert_eq!(progress, files.to_vec());
    assert_eq!(
        fs::read_to_string(dir.path().join("k02/k02.txt")).unwrap(),
        "Converted by mock"
    );

    let seen = generator.seen.lock().unwrap();
    assert_eq!(seen[0].1, ConversionProfile::VisuallyImpaired);
    assert_eq!(seen[0].2, None);
    assert_eq!(seen[0].3.as_deref(), Some("k02.md"));
    assert_eq!(seen[1].2.as_deref(), Some("k01.md"));
    assert_eq!(seen[1].3.as_deref(), Some("k03.md"));
}

#[test]
fn test_unsupported_format_lists_supported_ones() {
    let dir = lecture("epub");
    let err = Pandoc::new()
        .convert_file(dir.path().join("k01/k01.md"))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("epub"));
    assert!(message.contains("html"));
}

#[test]
fn test_missing_file_is_structural_error() {
    let dir = lecture("mock");
    let err = Pandoc::new()
        .convert_file(dir.path().join("k09/k09.md"))
        .unwrap_err();
    assert!(err.path().is_some());
}
