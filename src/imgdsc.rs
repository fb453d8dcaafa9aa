//! Snippets for image descriptions.
//!
//! Short descriptions go into the alternative text of the image. Long ones
//! are moved into a separate file of the chapter (`bilder.md` or
//! `images.md`, depending on the language) and the image links there.

use crate::config::Translate;
use crate::error::{Error, Result};
use crate::model::gen_id;
use serde::Serialize;

/// Descriptions longer than this are outsourced.
pub const MAX_INLINE_LENGTH: usize = 100;

/// MarkDown for an image description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptionSnippets {
    /// Text for the chapter file
    pub internal: String,

    /// Text for the file with outsourced descriptions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<String>,

    /// File the external text belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_file: Option<String>,
}

/// Builder for the description of one image.
#[derive(Debug, Clone)]
pub struct ImageDescription {
    image_path: String,
    description: String,
    title: Option<String>,
    outsource: bool,
    language: String,
}

impl ImageDescription {
    /// Describe the image at `image_path`, relative to the chapter file.
    pub fn new(image_path: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            description: "no description".into(),
            title: None,
            outsource: false,
            language: "de".into(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Title of an outsourced description.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Outsource the description regardless of its length.
    pub fn with_outsourcing(mut self, outsource: bool) -> Self {
        self.outsource = outsource;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Whether the description ends up in the file of outsourced descriptions.
    pub fn is_outsourced(&self) -> bool {
        self.outsource || self.description.trim().chars().count() > MAX_INLINE_LENGTH
    }

    /// Name of the file holding outsourced descriptions.
    pub fn outsourcing_file(&self) -> String {
        format!("{}.md", Translate::new(&self.language).get("images"))
    }

    /// Generate the snippets. Outsourced descriptions need a title.
    pub fn get_output(&self) -> Result<DescriptionSnippets> {
        if self.image_path.trim().is_empty() {
            return Err(Error::Other("no image path given".into()));
        }
        let description = self.description.trim();
        if !self.is_outsourced() {
            return Ok(DescriptionSnippets {
                internal: format!(
                    "![{}]({})",
                    description.replace(['\r', '\n'], " "),
                    self.image_path
                ),
                external: None,
                external_file: None,
            });
        }

        let title = match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title,
            _ => {
                return Err(Error::Other(
                    "a title is required for outsourced image descriptions".into(),
                ))
            }
        };
        let t = Translate::new(&self.language);
        let heading = format!("{} {}", t.get("description of image"), title);
        let file = self.outsourcing_file();
        let link = format!("{}.html#{}", file.trim_end_matches(".md"), gen_id(&heading));
        let internal = format!(
            "[![{}: {}]({})]({})",
            t.get("outsourced image description"),
            title,
            self.image_path,
            link
        );
        let external = format!(
            "### {}\n\n![]({})\n\n{}\n\n* * * * *\n",
            heading, self.image_path, description
        );
        Ok(DescriptionSnippets {
            internal,
            external: Some(external),
            external_file: Some(file),
        })
    }
}
