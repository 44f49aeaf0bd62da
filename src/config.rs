//! Configuration types for the record modifier.
//!
//! A [`RuleSet`] is the flat, ordered set of named options the stage is
//! configured with. Control options (`remove_keys`, `char_encoding`, ...)
//! select behavior; every other option is a static field to inject.

use crate::modifier::ModifierError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::path::Path;

/// Top-level keys to delete.
pub const REMOVE_KEYS: &str = "remove_keys";
/// Top-level keys to keep; everything else is deleted.
pub const WHITELIST_KEYS: &str = "whitelist_keys";
/// Dot-delimited paths to delete.
pub const REMOVE_PATH: &str = "remove_path";
/// `encoding` to relabel, or `from:to` to convert.
pub const CHAR_ENCODING: &str = "char_encoding";
/// Flag: inject the record's tag.
pub const INCLUDE_TAG_KEY: &str = "include_tag_key";
/// Key the tag is injected under.
pub const TAG_KEY: &str = "tag_key";
/// Tag to re-emit records under.
pub const TAG: &str = "tag";
/// Plugin type directive of the host framework.
pub const TYPE: &str = "type";

pub const DEFAULT_TAG_KEY: &str = "tag";

const CONTROL_OPTIONS: &[&str] = &[
    REMOVE_KEYS,
    WHITELIST_KEYS,
    REMOVE_PATH,
    CHAR_ENCODING,
    INCLUDE_TAG_KEY,
    TAG_KEY,
    TAG,
    TYPE,
];

/// Whether `name` is a control option (or a host directive) rather than a
/// static field.
pub fn is_reserved(name: &str) -> bool {
    name.starts_with('@') || CONTROL_OPTIONS.contains(&name)
}

/// Ordered set of named options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    options: Map<String, JsonValue>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set an option. Re-setting an option keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<JsonValue>) {
        self.options.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.options.get(name)
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Options in configured order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Parse the directive format: one `name value` pair per line.
    ///
    /// Blank lines and `#` comments are skipped. A value wrapped in matching
    /// single or double quotes is unquoted. A bare `name` is a flag set to
    /// `true`. Later lines override earlier ones.
    pub fn parse_directives(text: &str) -> Self {
        let mut rules = Self::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split_once(char::is_whitespace) {
                Some((name, value)) => rules.insert(name, unquote(value.trim())),
                None => rules.insert(line, true),
            }
        }

        rules
    }

    /// Load from a file: `.yaml`/`.yml` and `.json` by extension, the
    /// directive format otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ModifierError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ModifierError::Io {
            path: path.display().to_string(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Ok(Self::from_yaml(&content)?),
            Some("json") => Ok(Self::from_json(&content)?),
            _ => Ok(Self::parse_directives(&content)),
        }
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Configuration errors. All of them are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("`remove_keys` and `whitelist_keys` are mutually exclusive")]
    ConflictingKeyFilters,

    #[error("malformed char_encoding '{0}': expected `encoding` or `from:to`")]
    MalformedEncoding(String),

    #[error("unknown character encoding '{0}'")]
    UnknownEncoding(String),

    #[error("cannot convert into '{0}'")]
    UnsupportedTargetEncoding(String),

    #[error("unknown expression '${{{0}}}'")]
    UnknownExpression(String),

    #[error("invalid value for `{option}`: {reason}")]
    InvalidOption { option: String, reason: String },
}

impl ConfigError {
    fn invalid(option: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.to_string(),
            reason: reason.into(),
        }
    }
}

/// A comma-separated list, or a sequence of strings. Entries are trimmed
/// and empty entries dropped.
pub(crate) fn list_option(option: &str, value: &JsonValue) -> Result<Vec<String>, ConfigError> {
    let entries: Vec<String> = match value {
        JsonValue::Null => vec![],
        JsonValue::String(s) => s.split(',').map(str::to_string).collect(),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| match item {
                JsonValue::String(s) => Ok(s.clone()),
                other => Err(ConfigError::invalid(
                    option,
                    format!("expected a string entry, got {}", other),
                )),
            })
            .collect::<Result<_, _>>()?,
        other => {
            return Err(ConfigError::invalid(
                option,
                format!("expected a comma-separated list, got {}", other),
            ))
        }
    };

    Ok(entries
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect())
}

/// A boolean flag. Presence without a value (`null`) means set.
pub(crate) fn flag_option(option: &str, value: &JsonValue) -> Result<bool, ConfigError> {
    match value {
        JsonValue::Null => Ok(true),
        JsonValue::Bool(b) => Ok(*b),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" | "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            other => Err(ConfigError::invalid(
                option,
                format!("expected a boolean, got '{}'", other),
            )),
        },
        other => Err(ConfigError::invalid(
            option,
            format!("expected a boolean, got {}", other),
        )),
    }
}

/// A string or number rendered as a string. A bare flag has no value to
/// use and is rejected.
pub(crate) fn string_option(option: &str, value: &JsonValue) -> Result<String, ConfigError> {
    match value {
        JsonValue::String(s) => Ok(s.trim().to_string()),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(ConfigError::invalid(
            option,
            format!("expected a string, got {}", other),
        )),
    }
}
