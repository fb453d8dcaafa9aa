//! Error types for the matuc library.

use serde_json::{json, Map, Value};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for matuc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting or checking a lecture.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error (de)serialising JSON, e.g. the pandoc document tree.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrong file names, wrong directory structure and the like.
    #[error("Erroneous structure in {}: {message}", display_path(.path))]
    Structural {
        message: String,
        path: Option<PathBuf>,
    },

    /// The lecture configuration is broken or incompatible.
    #[error("in configuration {}: {message}", display_path(.path))]
    Configuration {
        message: String,
        path: Option<PathBuf>,
        line: Option<usize>,
    },

    /// A document is malformed; `excerpt` shows the offending text.
    #[error("{}{message}\nExcerpt: {excerpt}", path_prefix(.path))]
    Formatting {
        message: String,
        excerpt: String,
        path: Option<PathBuf>,
        line: Option<usize>,
    },

    /// An external program (pandoc, gladtex) failed.
    #[error("error while running: {command}\n{message}")]
    Subprocess {
        command: String,
        message: String,
        path: Option<PathBuf>,
    },

    /// A formula could not be converted.
    #[error("{}formula {formula_count}: {message}", path_prefix(.path))]
    Math {
        message: String,
        formula_count: usize,
        path: Option<PathBuf>,
        line: Option<usize>,
        pos: Option<usize>,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

fn path_prefix(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!("error in {}: ", p.display()),
        None => String::new(),
    }
}

impl Error {
    /// Create a structural error for the given path.
    pub fn structural(message: impl Into<String>, path: impl AsRef<Path>) -> Self {
        Error::Structural {
            message: message.into(),
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Create a configuration error for the given configuration file.
    pub fn configuration(message: impl Into<String>, path: Option<&Path>) -> Self {
        Error::Configuration {
            message: message.into(),
            path: path.map(Path::to_path_buf),
            line: None,
        }
    }

    /// Create a formatting error with an excerpt of the offending text.
    pub fn formatting(message: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Error::Formatting {
            message: message.into(),
            excerpt: excerpt.into(),
            path: None,
            line: None,
        }
    }

    /// Create a subprocess error. `command` is rendered shell-quoted.
    pub fn subprocess<S: AsRef<str>>(
        command: &[S],
        message: impl Into<String>,
        cwd: Option<&Path>,
    ) -> Self {
        let command = command
            .iter()
            .map(|arg| shell_quote(arg.as_ref()))
            .collect::<Vec<_>>()
            .join(" ");
        Error::Subprocess {
            command,
            message: message.into(),
            path: cwd.map(Path::to_path_buf),
        }
    }

    /// Attach a path if the error does not carry one yet.
    pub fn with_path(mut self, new_path: impl AsRef<Path>) -> Self {
        match &mut self {
            Error::Structural { path, .. }
            | Error::Configuration { path, .. }
            | Error::Formatting { path, .. }
            | Error::Subprocess { path, .. }
            | Error::Math { path, .. } => {
                if path.is_none() {
                    *path = Some(new_path.as_ref().to_path_buf());
                }
            }
            _ => {}
        }
        self
    }

    /// Attach a line number to errors which support one.
    pub fn with_line(mut self, new_line: usize) -> Self {
        match &mut self {
            Error::Configuration { line, .. }
            | Error::Formatting { line, .. }
            | Error::Math { line, .. } => *line = Some(new_line),
            _ => {}
        }
        self
    }

    /// Path the error refers to, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Structural { path, .. }
            | Error::Configuration { path, .. }
            | Error::Formatting { path, .. }
            | Error::Subprocess { path, .. }
            | Error::Math { path, .. } => path.as_deref(),
            _ => None,
        }
    }

    /// Line number the error refers to, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Configuration { line, .. }
            | Error::Formatting { line, .. }
            | Error::Math { line, .. } => *line,
            _ => None,
        }
    }

    /// Plain message without path decoration.
    pub fn message(&self) -> String {
        match self {
            Error::Structural { message, .. }
            | Error::Configuration { message, .. }
            | Error::Formatting { message, .. }
            | Error::Math { message, .. } => message.clone(),
            Error::Subprocess {
                command, message, ..
            } => format!("error while running: {}\n{}", command, message),
            other => other.to_string(),
        }
    }

    /// Serialise to the `{path?, line?, pos?, message}` object used by the
    /// JSON front end.
    pub fn to_json(&self) -> Value {
        let mut data = Map::new();
        if let Some(path) = self.path() {
            data.insert("path".into(), json!(path.display().to_string()));
        }
        if let Some(line) = self.line() {
            data.insert("line".into(), json!(line));
        }
        if let Error::Math {
            pos: Some(pos),
            formula_count,
            ..
        } = self
        {
            data.insert("pos".into(), json!(pos));
            data.insert("formula_count".into(), json!(formula_count));
        }
        data.insert("message".into(), json!(self.message()));
        Value::Object(data)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Configuration {
            message: format!("malformed XML: {}", err),
            path: None,
            line: None,
        }
    }
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::structural("the file does not follow naming conventions", "k9.md");
        assert_eq!(
            err.to_string(),
            "Erroneous structure in k9.md: the file does not follow naming conventions"
        );

        let err = Error::configuration("missing key", Some(Path::new("conf.dcxml")));
        assert_eq!(err.to_string(), "in configuration conf.dcxml: missing key");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_subprocess_command_is_quoted() {
        let err = Error::subprocess(&["pandoc", "-o", "my file.html"], "boom", None);
        assert!(err
            .to_string()
            .starts_with("error while running: pandoc -o 'my file.html'\nboom"));
    }

    #[test]
    fn test_with_path_keeps_existing_path() {
        let err = Error::structural("x", "first").with_path("second");
        assert_eq!(err.path(), Some(Path::new("first")));
        let err = Error::formatting("x", "y").with_path("second").with_line(4);
        assert_eq!(err.path(), Some(Path::new("second")));
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn test_to_json_omits_unknown_fields() {
        let value = Error::Other("plain".into()).to_json();
        assert_eq!(value, json!({"message": "plain"}));

        let value = Error::formatting("bad", "excerpt")
            .with_path("k01/k01.md")
            .with_line(3)
            .to_json();
        assert_eq!(value["path"], "k01/k01.md");
        assert_eq!(value["line"], 3);
        assert_eq!(value["message"], "bad");
    }
}
