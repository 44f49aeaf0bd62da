//! Static field injection and tag injection.

use super::Stage;
use crate::config::DEFAULT_TAG_KEY;
use crate::record::{Record, Value};

/// Fields set on every record, overwriting whatever is there.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaticFields {
    fields: Vec<(String, Value)>,
}

impl StaticFields {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Stage for StaticFields {
    fn apply(&self, record: &mut Record, _tag: &str) {
        for (key, value) in &self.fields {
            record.insert(key.clone(), value.clone());
        }
    }

    fn name(&self) -> &'static str {
        "static_fields"
    }

    fn is_noop(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Whether, and under which key, the record's tag is injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    pub enabled: bool,
    pub injected_key: String,
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            injected_key: DEFAULT_TAG_KEY.to_string(),
        }
    }
}

impl Stage for TagPolicy {
    fn apply(&self, record: &mut Record, tag: &str) {
        if self.enabled {
            record.insert(self.injected_key.clone(), tag);
        }
    }

    fn name(&self) -> &'static str {
        "include_tag_key"
    }

    fn is_noop(&self) -> bool {
        !self.enabled
    }
}
