//! Record modifier stage for log/event pipelines.
//!
//! Applies a fixed, configured set of field mutations to every record:
//!
//! - Character encoding relabel (`utf-8`) or conversion (`utf-8:cp932`)
//! - Removal of nested paths (`b.b1.b1b1`)
//! - Removal or whitelisting of top-level keys
//! - Injection of static fields, with `${hostname}`-style values resolved once
//! - Injection of the record's tag under a configured key
//!
//! ## Configuration Example
//!
//! ```yaml
//! gen_host: "${hostname}"
//! foo: bar
//! include_tag_key: true
//! tag_key: included_tag
//! remove_keys: hoge
//! ```
//!
//! ## Encodings and JSON
//!
//! Every [`Text`] carries its bytes and the encoding they are declared in.
//! Converting rewrites the bytes, but JSON output (via [`Record::to_json`]
//! or `Serialize`) always decodes text back to UTF-8 strings. A converted
//! value therefore looks unchanged once serialized; read
//! [`Text::as_bytes`] to observe the transcoded bytes.

pub mod config;
pub mod context;
pub mod modifier;
pub mod path;
pub mod pipeline;
pub mod record;
pub mod transformer;

pub use config::{ConfigError, RuleSet};
pub use context::ExpressionContext;
pub use modifier::{Emitted, ModifierError, RecordModifier};
pub use path::FieldPath;
pub use pipeline::Pipeline;
pub use record::{Record, Text, Value};
