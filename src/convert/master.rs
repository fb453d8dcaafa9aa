//! Conversion of complete lecture trees.

use super::{ConversionProfile, Pandoc};
use crate::config::{ConfFactory, CONF_FILE_NAME};
use crate::error::{Error, Result};
use crate::filesystem::{get_markdown_files, FileWalker};
use crate::toc::{HeadingIndexer, TocFormatter};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the generated table of contents.
pub const TOC_FILE_NAME: &str = "inhalt.md";

/// Converts every lecture found below a directory.
///
/// Lectures are recognised by their configuration file. The first directory
/// level containing a configuration determines the lecture roots, so a
/// directory holding several lectures can be converted at once.
#[derive(Debug)]
pub struct Master {
    roots: Vec<PathBuf>,
    profile: ConversionProfile,
    force: bool,
}

impl Master {
    /// Find the lectures below `path`. MarkDown files without any
    /// configuration are an error.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let roots = find_lecture_roots(path)?;
        if roots.is_empty() {
            let has_markdown = FileWalker::new(path)
                .with_ignore_non_chapter_prefixed(false)
                .walk()?
                .iter()
                .any(|(_, _, files)| !files.is_empty());
            if has_markdown {
                return Err(Error::configuration(
                    format!(
                        "no configuration found below this directory; create a {} with `matuc conf init` first",
                        CONF_FILE_NAME
                    ),
                    Some(path),
                ));
            }
        }
        Ok(Self {
            roots,
            profile: ConversionProfile::default(),
            force: false,
        })
    }

    /// Set the conversion profile.
    pub fn with_profile(mut self, profile: ConversionProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Convert files even if their output is up to date.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Lecture roots found.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Write the table of contents of every lecture and convert all of its
    /// MarkDown files. Returns the files written.
    pub fn run(&self) -> Result<Vec<PathBuf>> {
        self.run_with_progress(|_| {})
    }

    /// Like [`Master::run`], calling `progress` after each converted file.
    pub fn run_with_progress<F: FnMut(&Path)>(&self, mut progress: F) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for root in &self.roots {
            debug!("converting lecture {}", root.display());
            let mut indexer = HeadingIndexer::new(root)?;
            indexer.walk()?;
            if !indexer.is_empty() {
                let toc = TocFormatter::new(indexer.get_index(), root)?.format();
                fs::write(root.join(TOC_FILE_NAME), toc)?;
            }

            let files: Vec<PathBuf> = get_markdown_files(root, true)?
                .into_iter()
                .flat_map(|(dir, _, files)| files.into_iter().map(move |f| dir.join(f)))
                .collect();
            let mut pandoc = Pandoc::new()
                .with_profile(self.profile)
                .with_force(self.force)
                .with_conf(ConfFactory::new().get_conf_instance(root)?);
            written.extend(pandoc.convert_files_with_progress(&files, &mut progress)?);
        }
        Ok(written)
    }
}

/// Breadth-first search for the first directory level holding lecture
/// configurations; all lecture roots of that level are returned.
fn find_lecture_roots(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Err(Error::structural("directory does not exist", path));
    }
    let mut level = vec![path.to_path_buf()];
    while !level.is_empty() {
        let roots: Vec<PathBuf> = level
            .iter()
            .filter(|dir| dir.join(CONF_FILE_NAME).is_file())
            .cloned()
            .collect();
        if !roots.is_empty() {
            return Ok(roots);
        }
        let mut next = Vec::new();
        for dir in &level {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                let hidden = entry.file_name().to_string_lossy().starts_with('.');
                if !hidden && entry.path().is_dir() {
                    next.push(entry.path());
                }
            }
        }
        next.sort();
        level = next;
    }
    Ok(Vec::new())
}
