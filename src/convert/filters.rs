//! Filters on the Pandoc JSON document tree.
//!
//! Pandoc represents a document as `{"pandoc-api-version", "meta", "blocks"}`
//! where every element is an object with its type in `t` and its content in
//! `c`. The filters below rewrite that tree before it is handed back to
//! Pandoc for writing the output format.

use crate::parser::parse_page_number;
use serde_json::{json, Value};

/// Action applied to every element: gets the element type and the element.
/// Returning a value replaces the element, which is then not descended into.
pub type Filter = fn(&str, &mut Value) -> Option<Value>;

/// Walk all elements below `value`, applying `action` top-down.
pub fn walk<F>(value: &mut Value, action: &mut F)
where
    F: FnMut(&str, &mut Value) -> Option<Value>,
{
    match value {
        Value::Array(items) => {
            for item in items.iter_mut() {
                let kind = item.get("t").and_then(Value::as_str).map(str::to_owned);
                if let Some(kind) = kind {
                    if let Some(replacement) = action(&kind, item) {
                        *item = replacement;
                        continue;
                    }
                }
                walk(item, action);
            }
        }
        Value::Object(map) => map.values_mut().for_each(|v| walk(v, action)),
        _ => {}
    }
}

/// Walk the blocks of a document.
pub fn walk_blocks<F>(document: &mut Value, action: &mut F)
where
    F: FnMut(&str, &mut Value) -> Option<Value>,
{
    if let Some(blocks) = document.get_mut("blocks") {
        walk(blocks, action);
    }
}

/// Apply filters one after another to the blocks of a document.
pub fn apply_filters(document: &mut Value, filters: &[Filter]) {
    for filter in filters {
        let mut filter = *filter;
        walk_blocks(document, &mut filter);
    }
}

/// Plain text of an element, with spaces and line breaks as single spaces.
pub fn stringify(value: &Value) -> String {
    fn collect(value: &Value, out: &mut String) {
        match value {
            Value::Array(items) => items.iter().for_each(|i| collect(i, out)),
            Value::Object(obj) => match obj.get("t").and_then(Value::as_str) {
                Some("Str") => out.push_str(obj.get("c").and_then(Value::as_str).unwrap_or("")),
                Some("Space") | Some("SoftBreak") | Some("LineBreak") => out.push(' '),
                Some("Code") | Some("Math") => {
                    if let Some(text) = obj.get("c").and_then(|c| c.get(1)).and_then(Value::as_str) {
                        out.push_str(text);
                    }
                }
                _ => {
                    if let Some(content) = obj.get("c") {
                        collect(content, out);
                    }
                }
            },
            _ => {}
        }
    }
    let mut out = String::new();
    collect(value, &mut out);
    out
}

/// Raw block of the given format, e.g. HTML.
pub fn raw_block(format: &str, text: impl Into<String>) -> Value {
    json!({"t": "RawBlock", "c": [format, text.into()]})
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Replace a page number paragraph (`|| - Seite 12 -`) by an HTML paragraph
/// with an anchor, so that the navigation bar can link to it.
pub fn page_number_extractor(kind: &str, element: &mut Value) -> Option<Value> {
    if kind != "Para" {
        return None;
    }
    let inlines = element.get("c")?.as_array()?;
    let first = inlines.iter().find_map(|i| i.get("c"))?;
    if !first.as_str().is_some_and(|t| t.starts_with("||")) {
        return None;
    }
    let text = stringify(&Value::Array(inlines.clone()));
    let page_number = parse_page_number(&text)?;
    let label = text[2..].trim();
    Some(raw_block(
        "html",
        format!(
            "<p><span id=\"{}\">{}</span></p>",
            page_number.anchor_id(),
            escape_html(label)
        ),
    ))
}

/// Links to MarkDown documents have to point to the converted HTML files.
pub fn html_link_converter(kind: &str, element: &mut Value) -> Option<Value> {
    if kind != "Link" {
        return None;
    }
    let target = element.get_mut("c")?.get_mut(2)?.get_mut(0)?;
    let url = target.as_str()?;
    if url.contains("://") {
        return None;
    }
    let (path, fragment) = match url.split_once('#') {
        Some((path, fragment)) => (path, Some(fragment)),
        None => (url, None),
    };
    let stem = path.strip_suffix(".md")?;
    let converted = match fragment {
        Some(fragment) => format!("{}.html#{}", stem, fragment),
        None => format!("{}.html", stem),
    };
    *target = Value::String(converted);
    None
}

/// Images in a paragraph of their own would get their description repeated
/// as caption. Remove the figure marker of older Pandoc versions and unwrap
/// figures of newer ones.
pub fn suppress_captions(kind: &str, element: &mut Value) -> Option<Value> {
    match kind {
        "Image" => {
            if let Some(title) = element
                .get_mut("c")
                .and_then(|c| c.get_mut(2))
                .and_then(|t| t.get_mut(1))
            {
                if title.as_str().is_some_and(|t| t.starts_with("fig:")) {
                    *title = Value::String(String::new());
                }
            }
            None
        }
        "Figure" => {
            let content = element.get("c")?;
            let attr = content.get(0)?.clone();
            let blocks = content.get(2)?.clone();
            Some(json!({"t": "Div", "c": [attr, blocks]}))
        }
        _ => None,
    }
}

/// Check whether an element of the given type occurs in the document.
pub fn contains_element(document: &Value, kind: &str) -> bool {
    match document {
        Value::Array(items) => items.iter().any(|i| contains_element(i, kind)),
        Value::Object(obj) => {
            obj.get("t").and_then(Value::as_str) == Some(kind)
                || obj.values().any(|v| contains_element(v, kind))
        }
        _ => false,
    }
}

/// Whether the document contains formulas.
pub fn has_math(document: &Value) -> bool {
    document
        .get("blocks")
        .is_some_and(|blocks| contains_element(blocks, "Math"))
}

/// Text of the first level-1 heading.
pub fn get_title(document: &Value) -> Option<String> {
    fn find(value: &Value) -> Option<String> {
        match value {
            Value::Array(items) => items.iter().find_map(find),
            Value::Object(obj) => {
                if obj.get("t").and_then(Value::as_str) == Some("Header") {
                    let content = obj.get("c")?;
                    if content.get(0).and_then(Value::as_u64) == Some(1) {
                        return content.get(2).map(stringify);
                    }
                }
                obj.get("c").and_then(find)
            }
            _ => None,
        }
    }
    document.get("blocks").and_then(find)
}
