//! Structured-text codecs.
//!
//! Every codec converts between text and plain nested data
//! ([`serde_json::Value`]). A configuration document must be an object at
//! the top level; empty or whitespace-only text reads as an empty object.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Codec errors
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Expected an object at the top level, found {0}")]
    NotAnObject(&'static str),
}

/// Supported serialization formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Yaml,
    Toml,
}

impl Format {
    /// Looks up a format by name (`json`, `yaml`/`yml`, `toml`).
    pub fn from_name(name: &str) -> Option<Format> {
        match name.to_ascii_lowercase().as_str() {
            "json" | "json5" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }

    /// Infers the format from a file name, ignoring a trailing `.gz`.
    ///
    /// - `app.yaml` → Yaml
    /// - `app.toml.gz` → Toml
    /// - `.conf` → None
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        let name = path.as_ref().file_name()?.to_str()?;
        let base = name.strip_suffix(".gz").unwrap_or(name);
        let (stem, extension) = base.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Format::from_name(extension)
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Yaml => "yaml",
            Format::Toml => "toml",
        }
    }

    /// Parses text into a top-level object.
    pub fn parse(&self, text: &str) -> Result<Map<String, Value>, FormatError> {
        if text.trim().is_empty() {
            return Ok(Map::new());
        }

        let value: Value = match self {
            Format::Json => serde_json::from_str(text)?,
            Format::Yaml => serde_yaml::from_str(text)?,
            Format::Toml => toml::from_str(text)?,
        };

        match value {
            Value::Object(object) => Ok(object),
            // A YAML document holding only comments parses as null
            Value::Null => Ok(Map::new()),
            other => Err(FormatError::NotAnObject(kind_of(&other))),
        }
    }

    /// Serializes plain data, pretty-printed with two-space indentation.
    pub fn stringify(&self, value: &Value) -> Result<String, FormatError> {
        let mut text = match self {
            Format::Json => serde_json::to_string_pretty(value)?,
            Format::Yaml => serde_yaml::to_string(value)?,
            Format::Toml => toml::to_string_pretty(value)?,
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        Ok(text)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_path() {
        assert_eq!(Format::from_path("app.json"), Some(Format::Json));
        assert_eq!(Format::from_path("dir/app.yml"), Some(Format::Yaml));
        assert_eq!(Format::from_path("app.toml.gz"), Some(Format::Toml));
        assert_eq!(Format::from_path("app.txt"), None);
        assert_eq!(Format::from_path(".conf"), None);
        assert_eq!(Format::from_path("noext"), None);
    }

    #[test]
    fn test_parse_each_format() {
        let expected = json!({"name": "demo", "port": 80});
        let json = Format::Json.parse(r#"{"name": "demo", "port": 80}"#).unwrap();
        let yaml = Format::Yaml.parse("name: demo\nport: 80\n").unwrap();
        let toml = Format::Toml.parse("name = \"demo\"\nport = 80\n").unwrap();
        assert_eq!(Value::Object(json), expected);
        assert_eq!(Value::Object(yaml), expected);
        assert_eq!(Value::Object(toml), expected);
    }

    #[test]
    fn test_parse_empty_is_empty_object() {
        assert!(Format::Json.parse("").unwrap().is_empty());
        assert!(Format::Yaml.parse("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = Format::Json.parse("[1, 2]").unwrap_err();
        assert!(matches!(err, FormatError::NotAnObject("an array")));
    }

    #[test]
    fn test_stringify_json_is_pretty() {
        let text = Format::Json.stringify(&json!({"a": {"b": 1}})).unwrap();
        assert_eq!(text, "{\n  \"a\": {\n    \"b\": 1\n  }\n}\n");
    }

    #[test]
    fn test_stringify_then_parse_preserves_key_order() {
        let value = json!({"zeta": 1, "alpha": {"beta": [1, 2]}});
        for format in [Format::Json, Format::Yaml, Format::Toml] {
            let text = format.stringify(&value).unwrap();
            let parsed = format.parse(&text).unwrap();
            let keys: Vec<&String> = parsed.keys().collect();
            assert_eq!(keys, vec!["zeta", "alpha"], "format {:?}", format);
        }
    }
}
