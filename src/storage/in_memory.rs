//! In-memory implementation of RecordStore for testing and development

use crate::core::filter::FilterSpec;
use crate::core::query::SortDirection;
use crate::core::record::Record;
use crate::core::store::{FindQuery, Populate, RecordStore};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

type Collections = HashMap<String, Vec<Record>>;

/// In-memory record store
///
/// Collections keep insertion order. Uses RwLock for thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryRecordStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))
    }

    fn matches(record: &Record, filter: &FilterSpec) -> bool {
        filter.matches_with(|field| record.get(field))
    }

    fn expand(collections: &Collections, mut record: Record, populate: &[Populate]) -> Record {
        for expansion in populate {
            let Some(related_id) = record
                .get_str(&expansion.field)
                .and_then(|id| Uuid::parse_str(id).ok())
            else {
                continue;
            };

            let related = collections
                .get(&expansion.collection)
                .and_then(|records| records.iter().find(|r| r.id == related_id))
                .map(|r| {
                    let r = r.clone();
                    if expansion.select.is_empty() {
                        r
                    } else {
                        r.select(&expansion.select)
                    }
                })
                .map_or(Value::Null, Record::into_json);

            record.set(&expansion.field, related);
        }
        record
    }
}

/// Missing fields sort first; strings and numbers compare naturally
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn count(&self, collection: &str, filter: &FilterSpec) -> Result<usize> {
        let collections = self.read()?;

        Ok(collections.get(collection).map_or(0, |records| {
            records.iter().filter(|r| Self::matches(r, filter)).count()
        }))
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>> {
        let collections = self.read()?;
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Record> = records
            .iter()
            .filter(|r| Self::matches(r, &query.filter))
            .collect();

        if let Some(sort) = &query.sort {
            // stable, so ties keep insertion order
            matched.sort_by(|a, b| {
                let ordering =
                    compare_fields(a.fields.get(&sort.field), b.fields.get(&sort.field));
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        Ok(matched
            .into_iter()
            .skip(query.skip)
            .take(query.limit.unwrap_or(usize::MAX))
            .map(|r| {
                let r = match &query.select {
                    Some(fields) => r.clone().select(fields),
                    None => r.clone(),
                };
                Self::expand(&collections, r, &query.populate)
            })
            .collect())
    }

    async fn find_by_id(&self, collection: &str, id: &Uuid) -> Result<Option<Record>> {
        let collections = self.read()?;

        Ok(collections
            .get(collection)
            .and_then(|records| records.iter().find(|r| &r.id == id))
            .cloned())
    }

    async fn insert(&self, collection: &str, record: Record) -> Result<Record> {
        let mut collections = self.write()?;
        let records = collections.entry(collection.to_string()).or_default();

        if records.iter().any(|r| r.id == record.id) {
            return Err(anyhow!(
                "Record {} already exists in {}",
                record.id,
                collection
            ));
        }

        records.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        collection: &str,
        id: &Uuid,
        fields: Map<String, Value>,
    ) -> Result<bool> {
        let mut collections = self.write()?;

        let Some(record) = collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|r| &r.id == id))
        else {
            return Ok(false);
        };

        record.fields.extend(fields);
        Ok(true)
    }

    async fn remove(&self, collection: &str, id: &Uuid) -> Result<()> {
        let mut collections = self.write()?;

        if let Some(records) = collections.get_mut(collection) {
            records.retain(|r| &r.id != id);
        }

        Ok(())
    }
}
