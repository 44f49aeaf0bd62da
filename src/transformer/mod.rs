//! Record transformation stages.

mod encoding;
mod fields;
mod keys;
mod paths;

pub use encoding::{lookup_encoding, EncodingPolicy};
pub use fields::{StaticFields, TagPolicy};
pub use keys::KeyFilter;
pub use paths::RemovePaths;

use crate::record::Record;

/// One step of the per-record pipeline.
///
/// Stages never fail: anything they cannot apply to a given record is
/// skipped for that record.
pub trait Stage: Send + Sync {
    /// Apply this stage to `record`, which arrived with `tag`.
    fn apply(&self, record: &mut Record, tag: &str);

    /// Get the stage name for debugging.
    fn name(&self) -> &'static str;

    /// Whether applying this stage can change anything.
    fn is_noop(&self) -> bool {
        false
    }
}
