//! Nested path removal.

use super::Stage;
use crate::path::FieldPath;
use crate::record::Record;
use tracing::trace;

/// Paths to delete, in configured order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemovePaths {
    paths: Vec<FieldPath>,
}

impl RemovePaths {
    pub fn new(paths: Vec<FieldPath>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[FieldPath] {
        &self.paths
    }
}

impl Stage for RemovePaths {
    fn apply(&self, record: &mut Record, _tag: &str) {
        for path in &self.paths {
            if path.remove_from(record).is_none() {
                trace!(path = %path, "Path not present");
            }
        }
    }

    fn name(&self) -> &'static str {
        "remove_path"
    }

    fn is_noop(&self) -> bool {
        self.paths.is_empty()
    }
}
