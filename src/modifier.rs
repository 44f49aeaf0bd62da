//! Record modifier stage.

use crate::config::{ConfigError, RuleSet};
use crate::pipeline::Pipeline;
use crate::record::Record;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Record modifier stage.
///
/// Wraps a compiled [`Pipeline`] for the host: applies it to each record and
/// decides which tag the result is emitted under.
pub struct RecordModifier {
    /// Compiled pipeline, shared read-only
    pipeline: Arc<Pipeline>,
    /// Metrics: total records processed.
    records_total: AtomicU64,
}

/// A transformed record and the tag to emit it under.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Emitted {
    pub tag: String,
    pub record: Record,
}

impl RecordModifier {
    /// Create a new record modifier from a rule set.
    pub fn new(rules: &RuleSet) -> Result<Self, ConfigError> {
        let pipeline = Pipeline::compile(rules)?;
        Ok(Self::from_pipeline(Arc::new(pipeline)))
    }

    /// Wrap an already compiled pipeline.
    pub fn from_pipeline(pipeline: Arc<Pipeline>) -> Self {
        info!(
            emit_tag = pipeline.emit_tag().unwrap_or("<incoming>"),
            "Record modifier initialized"
        );

        Self {
            pipeline,
            records_total: AtomicU64::new(0),
        }
    }

    /// Create from a YAML configuration string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ModifierError> {
        let rules = RuleSet::from_yaml(yaml)?;
        Self::new(&rules).map_err(ModifierError::from)
    }

    /// Create from a JSON configuration string.
    pub fn from_json(json: &str) -> Result<Self, ModifierError> {
        let rules = RuleSet::from_json(json)?;
        Self::new(&rules).map_err(ModifierError::from)
    }

    /// Create from directive text (`name value` per line).
    pub fn from_directives(text: &str) -> Result<Self, ModifierError> {
        let rules = RuleSet::parse_directives(text);
        Self::new(&rules).map_err(ModifierError::from)
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Transform one record that arrived with `tag`.
    pub fn process(&self, tag: &str, record: Record) -> Emitted {
        self.records_total.fetch_add(1, Ordering::Relaxed);

        let record = self.pipeline.transform(record, tag);
        let tag = self.pipeline.emit_tag().unwrap_or(tag).to_string();

        debug!(tag = %tag, fields = record.len(), "Record modified");

        Emitted { tag, record }
    }

    /// Number of records processed so far.
    pub fn records_total(&self) -> u64 {
        self.records_total.load(Ordering::Relaxed)
    }
}

/// Record modifier errors.
#[derive(Debug, thiserror::Error)]
pub enum ModifierError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
