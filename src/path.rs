//! Dot-delimited field paths.

use crate::record::{Record, Value};
use std::fmt;

/// A location in a record, reached by descending through nested maps.
///
/// `b.b1.b1b1` means root -> `b` -> `b1` -> `b1b1`. A single-segment path
/// only ever names a top-level key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a dot-delimited path. Empty segments are dropped; returns `None`
    /// when nothing is left.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<String> = path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }

    /// Remove the value at this exact path.
    ///
    /// Returns `None` without touching the record when an intermediate
    /// segment is missing or is not a map, or the leaf key is absent.
    pub fn remove_from(&self, record: &mut Record) -> Option<Value> {
        let (leaf, parents) = self.segments.split_last()?;

        let mut current = record;
        for segment in parents {
            current = match current.get_mut(segment) {
                Some(Value::Map(inner)) => inner,
                _ => return None,
            };
        }

        current.remove(leaf)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
