//! Conversion of MarkDown lectures into their output format.
//!
//! Output formats are provided by [`OutputGenerator`] implementations,
//! looked up by format name in a [`ConverterRegistry`]. The [`Pandoc`]
//! orchestrator picks the generator configured for a lecture and converts
//! files with it; [`Master`] converts whole lecture trees including their
//! tables of contents.
//!
//! # Example
//!
//! ```no_run
//! use matuc::convert::{ConversionProfile, Pandoc};
//!
//! fn main() -> matuc::Result<()> {
//!     let mut pandoc = Pandoc::new().with_profile(ConversionProfile::VisuallyImpaired);
//!     pandoc.convert_files(&["k01/k01.md"])?;
//!     Ok(())
//! }
//! ```

mod filters;
mod html;
mod master;
mod pandoc;
mod process;

pub use filters::{
    apply_filters, contains_element, get_title, has_math, html_link_converter,
    page_number_extractor, stringify, suppress_captions, walk, Filter,
};
pub use html::{template_values, HtmlConverter};
pub use master::{Master, TOC_FILE_NAME};
pub use pandoc::Pandoc;
pub use process::{execute, is_installed};

use crate::config::LectureMetaData;
use crate::error::{Error, Result};
use crate::model::FileCache;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Target audience of a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversionProfile {
    /// Formulas as images with their LaTeX source as alternative text
    #[default]
    Blind,

    /// Formulas rendered by MathJax
    VisuallyImpaired,
}

impl ConversionProfile {
    /// Short name used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ConversionProfile::Blind => "blind",
            ConversionProfile::VisuallyImpaired => "vid",
        }
    }
}

impl fmt::Display for ConversionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConversionProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "blind" => Ok(ConversionProfile::Blind),
            "vid" | "visually-impaired" => Ok(ConversionProfile::VisuallyImpaired),
            other => Err(Error::Other(format!(
                "unknown conversion profile \"{}\", expected blind or vid",
                other
            ))),
        }
    }
}

/// Options for converting documents.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Conversion profile
    pub profile: ConversionProfile,

    /// Convert even if the output is up to date
    pub force: bool,
}

impl ConvertOptions {
    /// Create new conversion options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the conversion profile.
    pub fn with_profile(mut self, profile: ConversionProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Force conversion of up-to-date files.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// Everything a generator needs to know about the lecture a file belongs to.
#[derive(Debug, Clone, Copy)]
pub struct ConvertContext<'a> {
    pub conf: &'a LectureMetaData,
    pub cache: &'a FileCache,
    pub profile: ConversionProfile,
    pub force: bool,
}

impl<'a> ConvertContext<'a> {
    pub fn new(conf: &'a LectureMetaData, cache: &'a FileCache, options: &ConvertOptions) -> Self {
        Self {
            conf,
            cache,
            profile: options.profile,
            force: options.force,
        }
    }
}

/// An output format.
///
/// Implement this trait to add support for a new output format.
pub trait OutputGenerator: Send + Sync {
    /// Name of the format as used in the lecture configuration.
    fn format_name(&self) -> &str;

    /// File extension of generated files, without the leading dot.
    fn file_extension(&self) -> &str;

    /// Convert the MarkDown file at `path`. Returns the written file, or
    /// `None` if nothing had to be done.
    fn convert(&self, path: &Path, ctx: &ConvertContext<'_>) -> Result<Option<PathBuf>>;

    /// Path of the generated file for `path`.
    fn output_path(&self, path: &Path) -> PathBuf {
        path.with_extension(self.file_extension())
    }

    /// Check whether the output for `path` is missing or older than its
    /// source.
    fn needs_update(&self, path: &Path) -> bool {
        let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
        match (modified(path), modified(&self.output_path(path))) {
            (Some(source), Some(output)) => source > output,
            _ => true,
        }
    }
}

/// Registry for output generators.
///
/// The registry maps format names to generators.
pub struct ConverterRegistry {
    generators: HashMap<String, Arc<dyn OutputGenerator>>,
}

impl ConverterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            generators: HashMap::new(),
        }
    }

    /// Create a registry with the default generators (HTML).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(HtmlConverter::new()));
        registry
    }

    /// Register a generator under its format name.
    pub fn register(&mut self, generator: Arc<dyn OutputGenerator>) {
        self.generators
            .insert(generator.format_name().to_lowercase(), generator);
    }

    /// Get a generator by format name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn OutputGenerator>> {
        self.generators.get(&name.to_lowercase()).cloned()
    }

    /// Check if a format is supported.
    pub fn supports(&self, name: &str) -> bool {
        self.generators.contains_key(&name.to_lowercase())
    }

    /// Get all supported format names, sorted.
    pub fn supported_formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.generators.keys().map(|s| s.as_str()).collect();
        formats.sort_unstable();
        formats
    }

    /// Get the generator for `name`, or an error listing the supported ones.
    pub fn require(&self, name: &str) -> Result<Arc<dyn OutputGenerator>> {
        self.get_by_name(name).ok_or_else(|| {
            Error::Other(format!(
                "The configured format {} is not supported at the moment. Supported formats: {}",
                name,
                self.supported_formats().join(", ")
            ))
        })
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_convert_options_builder() {
        let options = ConvertOptions::new()
            .with_profile(ConversionProfile::VisuallyImpaired)
            .with_force(true);

        assert_eq!(options.profile, ConversionProfile::VisuallyImpaired);
        assert!(options.force);
        assert_eq!(ConvertOptions::default().profile, ConversionProfile::Blind);
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("vid".parse::<ConversionProfile>().unwrap(), ConversionProfile::VisuallyImpaired);
        assert_eq!("Blind".parse::<ConversionProfile>().unwrap(), ConversionProfile::Blind);
        assert!("braille".parse::<ConversionProfile>().is_err());
    }

    #[test]
    fn test_registry_with_defaults() {
        let registry = ConverterRegistry::with_defaults();
        assert!(registry.supports("html"));
        assert!(registry.supports("HTML"));
        assert!(!registry.supports("epub"));
    }

    #[test]
    fn test_registry_get_by_name() {
        let registry = ConverterRegistry::with_defaults();
        let generator = registry.get_by_name("html");
        assert!(generator.is_some());
        assert_eq!(generator.unwrap().file_extension(), "html");
    }

    #[test]
    fn test_unsupported_format_lists_supported_ones() {
        let registry = ConverterRegistry::with_defaults();
        let err = registry.require("epub").err().unwrap();
        assert!(err.to_string().contains("epub"));
        assert!(err.to_string().contains("Supported formats: html"));
    }

    #[test]
    fn test_missing_output_needs_update() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("k01.md");
        fs::write(&source, "# x\n").unwrap();
        let generator = HtmlConverter::new();
        assert_eq!(generator.output_path(&source), dir.path().join("k01.html"));
        assert!(generator.needs_update(&source));
    }
}
