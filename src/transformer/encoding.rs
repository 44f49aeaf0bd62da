//! Character encoding relabel/convert stage.

use super::Stage;
use crate::config::ConfigError;
use crate::record::{Record, Text, Value};
use encoding_rs::{Encoding, BIG5, EUC_JP, EUC_KR, GBK, REPLACEMENT, SHIFT_JIS};
use tracing::trace;

/// What to do with the encoding of every text value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EncodingPolicy {
    #[default]
    None,
    /// Declare the bytes to be in this encoding, without transcoding.
    Relabel(&'static Encoding),
    /// Transcode bytes believed to be in `from` into `to`.
    Convert {
        from: &'static Encoding,
        to: &'static Encoding,
    },
}

impl EncodingPolicy {
    /// Parse `encoding` or `from:to`.
    pub fn parse(option: &str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = option.split(':').map(str::trim).collect();

        match parts.as_slice() {
            [name] if !name.is_empty() => Ok(Self::Relabel(lookup_encoding(name)?)),
            [from, to] if !from.is_empty() && !to.is_empty() => {
                let from = lookup_encoding(from)?;
                let to = lookup_encoding(to)?;
                // encoding_rs encodes UTF-16 targets as UTF-8.
                if to.output_encoding() != to {
                    return Err(ConfigError::UnsupportedTargetEncoding(to.name().to_string()));
                }
                Ok(Self::Convert { from, to })
            }
            _ => Err(ConfigError::MalformedEncoding(option.trim().to_string())),
        }
    }

    fn apply_value(&self, value: &mut Value) {
        match value {
            Value::Text(text) => self.apply_text(text),
            Value::Array(items) => items.iter_mut().for_each(|v| self.apply_value(v)),
            Value::Map(inner) => inner.values_mut().for_each(|v| self.apply_value(v)),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    fn apply_text(&self, text: &mut Text) {
        match *self {
            Self::None => {}
            Self::Relabel(encoding) => text.relabel(encoding),
            Self::Convert { from, to } => {
                if !text.transcode(from, to) {
                    trace!(
                        from = from.name(),
                        to = to.name(),
                        "Text not convertible, leaving it unchanged"
                    );
                }
            }
        }
    }
}

/// Resolve an encoding name.
///
/// Accepts WHATWG labels plus a few common code-page aliases.
pub fn lookup_encoding(label: &str) -> Result<&'static Encoding, ConfigError> {
    let normalized = label.trim().to_ascii_lowercase();

    let encoding = match normalized.as_str() {
        "cp932" | "ms932" | "windows-31j" => Some(SHIFT_JIS),
        "cp936" => Some(GBK),
        "cp949" => Some(EUC_KR),
        "cp950" => Some(BIG5),
        "eucjp-ms" | "euc-jp-ms" | "cp51932" => Some(EUC_JP),
        other => Encoding::for_label(other.as_bytes()),
    };

    match encoding {
        Some(encoding) if encoding != REPLACEMENT => Ok(encoding),
        _ => Err(ConfigError::UnknownEncoding(label.trim().to_string())),
    }
}

impl Stage for EncodingPolicy {
    fn apply(&self, record: &mut Record, _tag: &str) {
        if self.is_noop() {
            return;
        }
        for value in record.values_mut() {
            self.apply_value(value);
        }
    }

    fn name(&self) -> &'static str {
        "char_encoding"
    }

    fn is_noop(&self) -> bool {
        matches!(self, Self::None)
    }
}
