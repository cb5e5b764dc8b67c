//! Storage engine contract
//!
//! The engine is an opaque data source: it counts, finds (with sort,
//! skip/limit and single-level expansion), looks up by id, and applies the
//! handful of writes the admin endpoints need. Everything is asynchronous and
//! may fail with a generic error.

use crate::core::filter::FilterSpec;
use crate::core::query::{FetchWindow, SortSpec};
use crate::core::record::Record;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Single-level expansion performed natively by the storage engine
///
/// Replaces the id stored in `field` with the referenced record from
/// `collection`, reduced to `select` (all fields when empty). Ids that do not
/// resolve are left as null.
#[derive(Debug, Clone, PartialEq)]
pub struct Populate {
    pub field: String,
    pub collection: String,
    pub select: Vec<String>,
}

impl Populate {
    pub fn new(field: &str, collection: &str, select: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            collection: collection.to_string(),
            select: select.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Parameters of a `find`
#[derive(Debug, Clone, Default)]
pub struct FindQuery {
    pub filter: FilterSpec,
    pub sort: Option<SortSpec>,
    pub skip: usize,
    pub limit: Option<usize>,
    pub populate: Vec<Populate>,
    /// Fields to return; all when `None`
    pub select: Option<Vec<String>>,
}

impl FindQuery {
    pub fn new(filter: FilterSpec) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn sort(mut self, sort: Option<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn window(mut self, window: FetchWindow) -> Self {
        self.skip = window.skip;
        self.limit = Some(window.limit);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn populate(mut self, populate: Vec<Populate>) -> Self {
        self.populate = populate;
        self
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select = Some(fields.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// Asynchronous record storage
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Number of records in `collection` matching `filter`
    async fn count(&self, collection: &str, filter: &FilterSpec) -> Result<usize>;

    /// Ordered records in `collection` matching the query
    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>>;

    /// Lookup by id
    async fn find_by_id(&self, collection: &str, id: &Uuid) -> Result<Option<Record>>;

    /// Insert a new record
    async fn insert(&self, collection: &str, record: Record) -> Result<Record>;

    /// Overwrite the given fields of a record; `Ok(false)` when it does not exist
    async fn update(&self, collection: &str, id: &Uuid, fields: Map<String, Value>)
    -> Result<bool>;

    /// Remove a record; removing a missing record succeeds
    async fn remove(&self, collection: &str, id: &Uuid) -> Result<()>;
}
