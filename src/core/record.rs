//! Schemaless records as stored by the storage engine

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A stored document: an identifier plus an open set of fields
///
/// The concrete schemas of news, departments and staff live in the presentation
/// layer; the core only needs the id and dynamic field access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Uuid,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create an empty record with a fresh id
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    /// Builder-style field setter
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    /// Get a field by name; `id` resolves to the record id
    pub fn get(&self, name: &str) -> Option<Value> {
        if name == "id" {
            return Some(Value::String(self.id.to_string()));
        }
        self.fields.get(name).cloned()
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Keep only the named fields (the id is always kept)
    pub fn select(mut self, fields: &[String]) -> Self {
        self.fields.retain(|name, _| fields.iter().any(|f| f == name));
        self
    }

    pub fn into_json(self) -> Value {
        let mut map = self.fields;
        map.insert("id".to_string(), Value::String(self.id.to_string()));
        Value::Object(map)
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}
