//! Record model: ordered string-keyed maps whose text values carry a
//! declared character encoding.

use encoding_rs::{Encoding, UTF_8};
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value as JsonValue;
use std::borrow::Cow;
use std::fmt;

/// A single structured event.
///
/// Keys are unique and keep their insertion order. Overwriting an existing
/// key keeps its position; removing a key shifts the following keys up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

/// A record value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(Text),
    Array(Vec<Value>),
    Map(Record),
}

/// A byte string tagged with the encoding it is declared to be in.
#[derive(Clone, PartialEq)]
pub struct Text {
    bytes: Vec<u8>,
    encoding: &'static Encoding,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from a JSON value. Returns `None` unless the value is
    /// an object.
    pub fn from_json(value: JsonValue) -> Option<Self> {
        match value {
            JsonValue::Object(map) => Some(Self::from(map)),
            _ => None,
        }
    }

    /// Convert back to JSON. Text is decoded according to its declared
    /// encoding, with malformed sequences replaced.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.fields.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Set `key` to `value`, returning the previous value if there was one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(key.into(), value.into())
    }

    /// Remove `key`, preserving the relative order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Keep only the entries for which `keep` returns true, in order.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &Value) -> bool) {
        self.fields.retain(|k, v| keep(k.as_str(), v));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.fields.values_mut()
    }
}

impl From<serde_json::Map<String, JsonValue>> for Record {
    fn from(map: serde_json::Map<String, JsonValue>) -> Self {
        map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Value {
    /// Convert to JSON, decoding text lossily.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => JsonValue::Number(n.clone()),
            Value::Text(t) => JsonValue::String(t.to_string_lossy().into_owned()),
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(record) => record.to_json(),
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Value::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Record> {
        match self {
            Value::Map(r) => Some(r),
            _ => None,
        }
    }
}

impl From<JsonValue> for Value {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(b),
            JsonValue::Number(n) => Value::Number(n),
            JsonValue::String(s) => Value::Text(Text::new(s)),
            JsonValue::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            JsonValue::Object(map) => Value::Map(Record::from(map)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(Text::new(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(Text::new(s))
    }
}

impl From<Text> for Value {
    fn from(t: Text) -> Self {
        Value::Text(t)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Map(r)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::Text(t) => serializer.serialize_str(&t.to_string_lossy()),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(record) => record.serialize(serializer),
        }
    }
}

impl Text {
    /// UTF-8 text.
    pub fn new(s: impl Into<String>) -> Self {
        Self {
            bytes: s.into().into_bytes(),
            encoding: UTF_8,
        }
    }

    /// Raw bytes declared to be in `encoding`. The bytes are not validated.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>, encoding: &'static Encoding) -> Self {
        Self {
            bytes: bytes.into(),
            encoding,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Change the declared encoding without touching the bytes.
    pub fn relabel(&mut self, encoding: &'static Encoding) {
        self.encoding = encoding;
    }

    /// Reinterpret the bytes as `from` and re-encode them into `to`.
    ///
    /// Returns false and leaves the text untouched when the bytes are not
    /// valid `from`, or when some character has no representation in `to`.
    pub fn transcode(&mut self, from: &'static Encoding, to: &'static Encoding) -> bool {
        let converted = {
            let Some(decoded) =
                from.decode_without_bom_handling_and_without_replacement(&self.bytes)
            else {
                return false;
            };
            let (encoded, actual, unmappable) = to.encode(&decoded);
            if unmappable {
                return false;
            }
            (encoded.into_owned(), actual)
        };
        (self.bytes, self.encoding) = converted;
        true
    }

    /// Decode according to the declared encoding.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        self.encoding.decode_without_bom_handling(&self.bytes).0
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text({:?}, {})", self.to_string_lossy(), self.encoding.name())
    }
}
