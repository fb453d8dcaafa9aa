//! Conversion of single files with the generator configured for their lecture.

use super::{ConversionProfile, ConvertContext, ConvertOptions, ConverterRegistry};
use crate::config::{ConfFactory, LectureMetaData, MetaInfo};
use crate::error::{Error, Result};
use crate::filesystem::{get_lecture_root, FileWalker};
use crate::model::FileCache;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Converts MarkDown files of a lecture.
///
/// The configuration and the chapter cache are looked up from the first
/// converted file, all files are expected to belong to the same lecture.
pub struct Pandoc {
    conf: Option<LectureMetaData>,
    options: ConvertOptions,
    registry: ConverterRegistry,
}

impl Pandoc {
    /// Create an orchestrator with the default generators.
    pub fn new() -> Self {
        Self {
            conf: None,
            options: ConvertOptions::default(),
            registry: ConverterRegistry::with_defaults(),
        }
    }

    /// Set the conversion profile.
    pub fn with_profile(mut self, profile: ConversionProfile) -> Self {
        self.options.profile = profile;
        self
    }

    /// Convert files even if their output is up to date.
    pub fn with_force(mut self, force: bool) -> Self {
        self.options.force = force;
        self
    }

    /// Use this configuration instead of looking it up.
    pub fn with_conf(mut self, conf: LectureMetaData) -> Self {
        self.conf = Some(conf);
        self
    }

    /// Use another set of generators.
    pub fn with_registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Configuration in use, if already known.
    pub fn conf(&self) -> Option<&LectureMetaData> {
        self.conf.as_ref()
    }

    /// Cache of all chapter files of the lecture `path` belongs to. Files
    /// outside a lecture get a cache of their own directory.
    fn build_cache(path: &Path) -> Result<FileCache> {
        let root = match get_lecture_root(path) {
            Some(root) => root,
            None => match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            },
        };
        debug!("building chapter cache for {}", root.display());
        FileCache::new(FileWalker::new(root).walk()?)
    }

    /// Convert a single file.
    pub fn convert_file(&mut self, path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
        let path = path.as_ref();
        self.convert_files_with_progress(&[path], |_| {})
            .map(|mut written| written.pop())
    }

    /// Convert the given files, returning the files written.
    pub fn convert_files<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<Vec<PathBuf>> {
        self.convert_files_with_progress(files, |_| {})
    }

    /// Convert the given files, calling `progress` after each one.
    pub fn convert_files_with_progress<P, F>(
        &mut self,
        files: &[P],
        mut progress: F,
    ) -> Result<Vec<PathBuf>>
    where
        P: AsRef<Path>,
        F: FnMut(&Path),
    {
        let Some(first) = files.first() else {
            return Ok(Vec::new());
        };
        let first = first.as_ref();
        if !first.exists() {
            return Err(Error::structural("file does not exist", first));
        }
        let conf = match self.conf.take() {
            Some(conf) => conf,
            None => ConfFactory::new().get_conf_instance(first)?,
        };
        let conf = &*self.conf.insert(conf);
        let generator = self.registry.require(conf.get(MetaInfo::Format))?;
        let cache = Self::build_cache(first)?;
        let ctx = ConvertContext::new(conf, &cache, &self.options);

        let mut written = Vec::new();
        for file in files {
            let file = file.as_ref();
            if !file.exists() {
                return Err(Error::structural("file does not exist", file));
            }
            if let Some(output) = generator.convert(file, &ctx).map_err(|e| e.with_path(file))? {
                info!("converted {} to {}", file.display(), output.display());
                written.push(output);
            }
            progress(file);
        }
        Ok(written)
    }
}

impl Default for Pandoc {
    fn default() -> Self {
        Self::new()
    }
}
