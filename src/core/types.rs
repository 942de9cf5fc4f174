use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Document identifier. Generated as a timestamp-derived, strictly
/// monotonic integer, so ascending id order is ascending insertion order.
/// Cursor pagination relies on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u64);

impl DocId {
    pub fn new(id: u64) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for DocId {
    fn from(id: u64) -> Self {
        DocId(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
    Boolean(bool),
}

impl FieldValue {
    /// Convert a JSON value into a field value. Objects, arrays and null
    /// have no indexable representation and map to None.
    pub fn from_json(value: &serde_json::Value) -> Option<FieldValue> {
        match value {
            serde_json::Value::String(s) => Some(FieldValue::Text(s.clone())),
            serde_json::Value::Number(n) => n.as_f64().map(FieldValue::Number),
            serde_json::Value::Bool(b) => Some(FieldValue::Boolean(*b)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A stored document: the minimal required schema plus arbitrary named
/// fields looked up by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    /// Milliseconds since epoch, set once at insert.
    pub created_at: u64,
    /// Milliseconds since epoch, bumped on every update.
    pub updated_at: u64,
    /// De-duplicated index vocabulary of this document, recomputed on every
    /// (re)index. Lets query-time filtering skip re-tokenization.
    pub terms: Vec<String>,
    pub fields: HashMap<String, FieldValue>,
}

impl Document {
    pub fn new(id: DocId) -> Self {
        Document {
            id,
            created_at: 0,
            updated_at: 0,
            terms: Vec::new(),
            fields: HashMap::new(),
        }
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// All text field values, the material the index is built from.
    pub fn text_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .filter_map(|(name, value)| value.as_text().map(|s| (name.as_str(), s)))
    }

    /// Build a field map from a JSON object, dropping non-scalar values.
    pub fn fields_from_json(object: &serde_json::Map<String, serde_json::Value>) -> HashMap<String, FieldValue> {
        object
            .iter()
            .filter_map(|(k, v)| FieldValue::from_json(v).map(|fv| (k.clone(), fv)))
            .collect()
    }
}
