//! JSON responses of the command line front end.
//!
//! Every invocation answers with one object holding any of `usage`,
//! `warnings`, `error` and `result`.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::{json, Value};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Answer of a command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Value>,
}

impl Response {
    /// Successful answer.
    pub fn result(result: impl Into<Value>) -> Self {
        Self {
            result: Some(result.into()),
            ..Self::default()
        }
    }

    /// Answer for a failed library call.
    pub fn error(error: &Error) -> Self {
        Self {
            error: Some(error.to_json()),
            ..Self::default()
        }
    }

    /// Answer for an error that has no library error, e.g. bad input.
    pub fn error_message(message: impl Into<String>) -> Self {
        Self {
            error: Some(json!({ "message": message.into() })),
            ..Self::default()
        }
    }

    /// Usage information, optionally with the error that caused it.
    pub fn usage(usage: impl Into<String>, error: Option<&str>) -> Self {
        Self {
            usage: Some(usage.into()),
            error: error.map(|e| Value::String(e.trim_end().to_string())),
            ..Self::default()
        }
    }

    /// Attach warnings; each one becomes an object with a message.
    pub fn with_warnings<I, S>(mut self, warnings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.warnings
            .extend(warnings.into_iter().map(|w| json!({ "message": w.into() })));
        self
    }

    /// Whether this answer reports an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Serialise the answer.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        let text = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(self)?,
            JsonFormat::Compact => serde_json::to_string(self)?,
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_result_omits_empty_fields() {
        let json = Response::result(json!({"is within a lecture": true}))
            .to_json(JsonFormat::Compact)
            .unwrap();
        assert_eq!(json, r#"{"result":{"is within a lecture":true}}"#);
    }

    #[test]
    fn test_error_carries_location() {
        let err = Error::structural("file is not part of the lecture", Path::new("k01/k01.md"));
        let value: Value =
            serde_json::from_str(&Response::error(&err).to_json(JsonFormat::Pretty).unwrap())
                .unwrap();
        assert_eq!(value["error"]["path"], "k01/k01.md");
        assert_eq!(value["error"]["message"], "file is not part of the lecture");
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_usage_with_error_and_warnings() {
        let response = Response::usage("matuc mk <path>", Some("path required\n"))
            .with_warnings(["configuration was upgraded"]);
        let value: Value = serde_json::from_str(&response.to_json(JsonFormat::Compact).unwrap()).unwrap();
        assert_eq!(value["usage"], "matuc mk <path>");
        assert_eq!(value["error"], "path required");
        assert_eq!(value["warnings"][0]["message"], "configuration was upgraded");
        assert!(response.is_error());
    }

    #[test]
    fn test_pretty_has_newlines() {
        let json = Response::result("ok").to_json(JsonFormat::Pretty).unwrap();
        assert!(json.contains('\n'));
    }
}
