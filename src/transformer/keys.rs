//! Top-level key removal and whitelisting.

use super::Stage;
use crate::record::Record;
use indexmap::IndexSet;

/// Which top-level keys survive.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyFilter {
    #[default]
    None,
    /// Delete these keys when present.
    Remove(IndexSet<String>),
    /// Keep only these keys.
    Whitelist(IndexSet<String>),
}

impl KeyFilter {
    pub fn keys(&self) -> Option<&IndexSet<String>> {
        match self {
            Self::None => None,
            Self::Remove(keys) | Self::Whitelist(keys) => Some(keys),
        }
    }
}

impl Stage for KeyFilter {
    fn apply(&self, record: &mut Record, _tag: &str) {
        match self {
            Self::None => {}
            Self::Remove(keys) => {
                for key in keys {
                    record.remove(key);
                }
            }
            Self::Whitelist(keys) => record.retain(|key, _| keys.contains(key)),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::None => "key_filter",
            Self::Remove(_) => "remove_keys",
            Self::Whitelist(_) => "whitelist_keys",
        }
    }

    fn is_noop(&self) -> bool {
        matches!(self, Self::None)
    }
}
