//! JSON values as seen by the loader
//!
//! Payloads arrive as `serde_json::Value`, but the loader works on its own
//! closed union so every kind of value the store cannot hold (binary data,
//! out-of-range integers) is an explicit variant rather than a runtime surprise.

use serde_json::Value;

/// A decoded JSON value
#[derive(Debug, Clone, PartialEq)]
pub enum JsonValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Object(JsonObject),
    Array(Vec<JsonValue>),
    /// A value with no column type, e.g. an unsigned integer above `i64::MAX`
    Unsupported { kind: String },
}

impl JsonValue {
    /// Name of the variant, used when reporting values that could not be loaded
    pub fn kind(&self) -> &str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "boolean",
            JsonValue::Integer(_) => "integer",
            JsonValue::Real(_) => "real",
            JsonValue::Text(_) => "text",
            JsonValue::Blob(_) => "binary",
            JsonValue::Object(_) => "object",
            JsonValue::Array(_) => "array",
            JsonValue::Unsupported { kind } => kind.as_str(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    pub fn as_object(&self) -> Option<&JsonObject> {
        match self {
            JsonValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            JsonValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Text form used when a value becomes part of a table name
    pub fn name_fragment(&self) -> String {
        match self {
            JsonValue::Integer(n) => n.to_string(),
            JsonValue::Real(f) => f.to_string(),
            JsonValue::Text(s) => s.clone(),
            JsonValue::Bool(b) => b.to_string(),
            other => other.kind().to_string(),
        }
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    JsonValue::Integer(i)
                } else if n.is_u64() {
                    JsonValue::Unsupported {
                        kind: "u64".to_string(),
                    }
                } else {
                    // Without arbitrary_precision every non-integral number is an f64
                    JsonValue::Real(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => JsonValue::Text(s),
            Value::Array(arr) => JsonValue::Array(arr.into_iter().map(JsonValue::from).collect()),
            Value::Object(obj) => JsonValue::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, JsonValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// An object whose keys keep the order they appeared in the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonObject {
    entries: Vec<(String, JsonValue)>,
}

impl JsonObject {
    pub fn new() -> Self {
        JsonObject::default()
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replace the value of an existing key in place, or append a new key
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, JsonValue)> for JsonObject {
    fn from_iter<I: IntoIterator<Item = (String, JsonValue)>>(iter: I) -> Self {
        let mut obj = JsonObject::new();
        for (k, v) in iter {
            obj.insert(k, v);
        }
        obj
    }
}
