//! Compile-time expression context for derived static values.
//!
//! Static field values may embed `${...}` expressions. They are resolved
//! exactly once, while the pipeline is compiled, and the result is stored as
//! a plain literal.

use crate::config::ConfigError;
use crate::record::{Record, Value};
use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for matching variable expressions like ${...}
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Values available to `${...}` expressions.
#[derive(Debug, Clone)]
pub struct ExpressionContext {
    /// Local machine hostname
    pub hostname: String,
    /// Compile timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Current process id
    pub pid: u32,
    /// Environment snapshot
    pub env: HashMap<String, String>,
}

impl ExpressionContext {
    /// Capture the current process environment.
    pub fn from_environment() -> Self {
        Self {
            hostname: gethostname::gethostname().to_string_lossy().trim().to_string(),
            timestamp: chrono::Utc::now(),
            pid: std::process::id(),
            env: std::env::vars().collect(),
        }
    }

    /// A context with fixed values and an empty environment.
    pub fn new(hostname: impl Into<String>, timestamp: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            hostname: hostname.into(),
            timestamp,
            pid: std::process::id(),
            env: HashMap::new(),
        }
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Resolve a variable expression.
    ///
    /// Supports:
    /// - `${hostname}` - Local hostname
    /// - `${now}` - Compile timestamp (RFC 3339)
    /// - `${pid}` - Process id
    /// - `${env.NAME}` - Environment variable, empty when unset
    pub fn resolve(&self, expr: &str) -> Option<String> {
        let expr = expr.trim();

        if let Some(name) = expr.strip_prefix("env.") {
            return Some(self.env.get(name).cloned().unwrap_or_default());
        }

        match expr {
            "hostname" => Some(self.hostname.clone()),
            "now" => Some(self.timestamp.to_rfc3339()),
            "pid" => Some(self.pid.to_string()),
            _ => None,
        }
    }

    /// Interpolate all ${...} variables in a string.
    pub fn interpolate(&self, template: &str) -> Result<String, ConfigError> {
        if let Some(caps) = VAR_REGEX
            .captures_iter(template)
            .find(|caps| self.resolve(&caps[1]).is_none())
        {
            return Err(ConfigError::UnknownExpression(caps[1].trim().to_string()));
        }

        Ok(VAR_REGEX
            .replace_all(template, |caps: &regex::Captures| {
                self.resolve(&caps[1]).unwrap_or_default()
            })
            .into_owned())
    }

    /// Turn a configured value into a record value, interpolating every
    /// string inside it.
    pub fn interpolate_value(&self, value: &JsonValue) -> Result<Value, ConfigError> {
        Ok(match value {
            JsonValue::String(s) => Value::from(self.interpolate(s)?),
            JsonValue::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|v| self.interpolate_value(v))
                    .collect::<Result<_, _>>()?,
            ),
            JsonValue::Object(obj) => {
                let mut record = Record::new();
                for (k, v) in obj {
                    record.insert(k.clone(), self.interpolate_value(v)?);
                }
                Value::Map(record)
            }
            other => Value::from(other.clone()),
        })
    }
}
