//! MongoDB storage backend using the official MongoDB async driver.
//!
//! Provides a `MongoRecordStore` backed by a `mongodb::Database`.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag:
//! ```toml
//! [dependencies]
//! orgdesk = { version = "0.1", features = ["mongodb_backend"] }
//! ```
//!
//! # Storage model
//!
//! One collection per resource (`news`, `departments`, `users`). Records are
//! serialized via `serde_json::Value` and converted to BSON; the record `id`
//! is stored as a UUID string under MongoDB's `_id`.
//!
//! Substring matchers become an escaped `$regex`, so request input is never
//! interpreted as a pattern. `Populate` is served with one `$in` query per
//! expanded field for the whole page.

use crate::core::filter::{FilterSpec, Matcher, exact_candidates};
use crate::core::query::SortDirection;
use crate::core::record::Record;
use crate::core::store::{FindQuery, Populate, RecordStore};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::Database;
use mongodb::bson::{Bson, Document, doc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id` for MongoDB convention.
fn json_to_document(json: Value) -> Result<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| anyhow!("Failed to convert JSON to BSON: {}", e))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => return Err(anyhow!("Expected BSON document, got non-object")),
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id`.
fn document_to_json(mut doc: Document) -> Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn document_to_record(doc: Document) -> Result<Record> {
    serde_json::from_value(document_to_json(doc))
        .map_err(|e| anyhow!("Failed to deserialize record from document: {}", e))
}

fn record_to_document(record: &Record) -> Result<Document> {
    let json =
        serde_json::to_value(record).map_err(|e| anyhow!("Failed to serialize record: {}", e))?;
    json_to_document(json)
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

fn field_name(field: &str) -> &str {
    if field == "id" { "_id" } else { field }
}

/// Translate a FilterSpec into a MongoDB query document
fn filter_document(filter: &FilterSpec) -> Result<Document> {
    let mut doc = Document::new();

    for (field, matcher) in filter.iter() {
        let condition = match matcher {
            Matcher::Exact(value) => {
                let mut candidates = exact_candidates(value)
                    .iter()
                    .map(mongodb::bson::to_bson)
                    .collect::<std::result::Result<Vec<Bson>, _>>()
                    .map_err(|e| anyhow!("Invalid filter value for '{}': {}", field, e))?;
                if candidates.len() == 1 {
                    candidates.remove(0)
                } else {
                    Bson::Document(doc! { "$in": candidates })
                }
            }
            Matcher::Substring(pattern) => Bson::Document(doc! { "$regex": regex::escape(pattern) }),
        };
        doc.insert(field_name(field), condition);
    }

    Ok(doc)
}

/// The server rejects skips past `i64::MAX`; anything that far is an empty page anyway
fn skip_bound(skip: usize) -> u64 {
    u64::try_from(skip).unwrap_or(u64::MAX).min(i64::MAX as u64)
}

fn projection(fields: &[String]) -> Document {
    fields
        .iter()
        .map(|f| (field_name(f).to_string(), Bson::Int32(1)))
        .collect()
}

// ---------------------------------------------------------------------------
// MongoRecordStore
// ---------------------------------------------------------------------------

/// Record storage backed by MongoDB.
///
/// # Example
///
/// ```rust,ignore
/// use mongodb::Client;
/// use orgdesk::storage::MongoRecordStore;
///
/// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
/// let store = MongoRecordStore::new(client.database("orgdesk"));
/// ```
#[derive(Clone, Debug)]
pub struct MongoRecordStore {
    database: Database,
}

impl MongoRecordStore {
    /// Create a new `MongoRecordStore` with the given database handle.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Get a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.database.collection(name)
    }

    /// Embed referenced records for every `Populate` of the query
    async fn expand(&self, records: &mut [Record], populate: &[Populate]) -> Result<()> {
        for expansion in populate {
            let ids: Vec<Bson> = records
                .iter()
                .filter_map(|r| r.get_str(&expansion.field))
                .map(|id| Bson::String(id.to_string()))
                .collect();
            if ids.is_empty() {
                continue;
            }

            let related_collection = self.collection(&expansion.collection);
            let mut find = related_collection.find(doc! { "_id": { "$in": ids } });
            if !expansion.select.is_empty() {
                find = find.projection(projection(&expansion.select));
            }

            let related: HashMap<String, Value> = find
                .await
                .map_err(|e| anyhow!("Failed to populate '{}': {}", expansion.field, e))?
                .try_collect::<Vec<Document>>()
                .await
                .map_err(|e| anyhow!("Failed to collect '{}': {}", expansion.field, e))?
                .into_iter()
                .map(document_to_json)
                .filter_map(|json| {
                    let id = json.get("id")?.as_str()?.to_string();
                    Some((id, json))
                })
                .collect();

            for record in records.iter_mut() {
                let Some(id) = record.get_str(&expansion.field).map(str::to_string) else {
                    continue;
                };
                let value = related.get(&id).cloned().unwrap_or(Value::Null);
                record.set(&expansion.field, value);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn count(&self, collection: &str, filter: &FilterSpec) -> Result<usize> {
        let count = self
            .collection(collection)
            .count_documents(filter_document(filter)?)
            .await
            .map_err(|e| anyhow!("Failed to count {}: {}", collection, e))?;

        usize::try_from(count).map_err(|e| anyhow!("Count out of range: {}", e))
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>> {
        let target = self.collection(collection);
        let mut find = target
            .find(filter_document(&query.filter)?)
            .skip(skip_bound(query.skip));

        if let Some(sort) = &query.sort {
            let direction = match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            let sort_field = field_name(&sort.field);
            find = find.sort(doc! { sort_field: direction });
        }
        if let Some(limit) = query.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(select) = &query.select {
            find = find.projection(projection(select));
        }

        let docs: Vec<Document> = find
            .await
            .map_err(|e| anyhow!("Failed to find in {}: {}", collection, e))?
            .try_collect()
            .await
            .map_err(|e| anyhow!("Failed to collect {}: {}", collection, e))?;

        let mut records = docs
            .into_iter()
            .map(document_to_record)
            .collect::<Result<Vec<_>>>()?;

        self.expand(&mut records, &query.populate).await?;
        Ok(records)
    }

    async fn find_by_id(&self, collection: &str, id: &Uuid) -> Result<Option<Record>> {
        let doc = self
            .collection(collection)
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to get {} {}: {}", collection, id, e))?;

        doc.map(document_to_record).transpose()
    }

    async fn insert(&self, collection: &str, record: Record) -> Result<Record> {
        self.collection(collection)
            .insert_one(record_to_document(&record)?)
            .await
            .map_err(|e| anyhow!("Failed to insert into {}: {}", collection, e))?;

        Ok(record)
    }

    async fn update(
        &self,
        collection: &str,
        id: &Uuid,
        fields: Map<String, Value>,
    ) -> Result<bool> {
        let set = json_to_document(Value::Object(fields))?;
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": uuid_bson(id) }, doc! { "$set": set })
            .await
            .map_err(|e| anyhow!("Failed to update {} {}: {}", collection, id, e))?;

        Ok(result.matched_count > 0)
    }

    async fn remove(&self, collection: &str, id: &Uuid) -> Result<()> {
        self.collection(collection)
            .delete_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| anyhow!("Failed to delete {} {}: {}", collection, id, e))?;

        Ok(())
    }
}
