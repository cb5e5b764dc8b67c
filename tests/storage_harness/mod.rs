//! Shared test harness for orgdesk integration tests
//!
//! Provides an organisation fixture (departments, staff and one user per
//! role), a call-recording `RecordStore` wrapper, a wrapper failing chosen
//! calls, and helpers to build an `axum_test::TestServer` over any store.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod record_store_tests;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::{HeaderName, HeaderValue};
use orgdesk::config::{AdminConfig, DEPARTMENT_HEAD_ROLE};
use orgdesk::core::auth::SESSION_HEADER;
use orgdesk::core::filter::FilterSpec;
use orgdesk::core::record::Record;
use orgdesk::core::store::{FindQuery, RecordStore};
use orgdesk::server::ServerBuilder;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const USERS: &str = "users";
pub const DEPARTMENTS: &str = "departments";
pub const NEWS: &str = "news";

// ---------------------------------------------------------------------------
// Organisation fixture
// ---------------------------------------------------------------------------

/// Seeded organisation
///
/// - `sales` has a department head and two clerks
/// - `archive` has nobody
/// - `administrator`, `clerk` and `head` are users able to open a session
pub struct Organisation {
    pub administrator: Record,
    pub head: Record,
    pub clerk: Record,
    pub sales: Record,
    pub archive: Record,
}

pub async fn seed_organisation(store: &dyn RecordStore) -> Organisation {
    let sales = store
        .insert(
            DEPARTMENTS,
            Record::new()
                .field("title", "Sales")
                .field("type", "branch")
                .field("city", "Ningbo"),
        )
        .await
        .unwrap();
    let archive = store
        .insert(
            DEPARTMENTS,
            Record::new()
                .field("title", "Archive")
                .field("type", "office")
                .field("city", "Hangzhou"),
        )
        .await
        .unwrap();

    let administrator = store
        .insert(
            USERS,
            employee("Root", "A000", "administrator", None).field("password", "x"),
        )
        .await
        .unwrap();
    let head = store
        .insert(USERS, employee("Wang Fang", "S001", DEPARTMENT_HEAD_ROLE, Some(&sales)))
        .await
        .unwrap();
    let clerk = store
        .insert(USERS, employee("Li Lei", "S002", "clerk", Some(&sales)))
        .await
        .unwrap();
    store
        .insert(USERS, employee("Han Meimei", "S003", "clerk", Some(&sales)))
        .await
        .unwrap();

    Organisation {
        administrator,
        head,
        clerk,
        sales,
        archive,
    }
}

/// A user record in the shape the employee pages read
pub fn employee(name: &str, job_number: &str, role: &str, department: Option<&Record>) -> Record {
    let record = Record::new()
        .field("name", name)
        .field("jobNumber", job_number)
        .field("role", role)
        .field("phone", "0574-0000")
        .field(
            "cautioner",
            serde_json::json!({ "name": "Guarantor", "phone": "110" }),
        );
    match department {
        Some(department) => record.field("department", department.id.to_string()),
        None => record,
    }
}

/// Session header for `user`
pub fn session(user: &Record) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static(SESSION_HEADER),
        HeaderValue::from_str(&user.id.to_string()).unwrap(),
    )
}

// ---------------------------------------------------------------------------
// Test servers
// ---------------------------------------------------------------------------

pub fn test_server(store: Arc<dyn RecordStore>) -> axum_test::TestServer {
    test_server_with_config(store, AdminConfig::default_config())
}

pub fn test_server_with_config(
    store: Arc<dyn RecordStore>,
    config: AdminConfig,
) -> axum_test::TestServer {
    let router = ServerBuilder::new()
        .with_shared_store(store)
        .with_config(config)
        .build()
        .unwrap();
    axum_test::TestServer::new(router)
}

// ---------------------------------------------------------------------------
// RecordingStore
// ---------------------------------------------------------------------------

/// Store wrapper recording every call as `"<op> <collection>"`
pub struct RecordingStore {
    inner: Arc<dyn RecordStore>,
    calls: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<dyn RecordStore>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls made against `collection`
    pub fn calls_on(&self, collection: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.ends_with(&format!(" {}", collection)))
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn record(&self, op: &str, collection: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", op, collection));
    }
}

#[async_trait]
impl RecordStore for RecordingStore {
    async fn count(&self, collection: &str, filter: &FilterSpec) -> Result<usize> {
        self.record("count", collection);
        self.inner.count(collection, filter).await
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>> {
        self.record("find", collection);
        self.inner.find(collection, query).await
    }

    async fn find_by_id(&self, collection: &str, id: &Uuid) -> Result<Option<Record>> {
        self.record("find_by_id", collection);
        self.inner.find_by_id(collection, id).await
    }

    async fn insert(&self, collection: &str, record: Record) -> Result<Record> {
        self.record("insert", collection);
        self.inner.insert(collection, record).await
    }

    async fn update(&self, collection: &str, id: &Uuid, fields: Map<String, Value>) -> Result<bool> {
        self.record("update", collection);
        self.inner.update(collection, id, fields).await
    }

    async fn remove(&self, collection: &str, id: &Uuid) -> Result<()> {
        self.record("remove", collection);
        self.inner.remove(collection, id).await
    }
}

// ---------------------------------------------------------------------------
// FaultyStore
// ---------------------------------------------------------------------------

/// Store wrapper failing every call named in `failing` (as `"<op> <collection>"`)
pub struct FaultyStore {
    inner: Arc<dyn RecordStore>,
    failing: Vec<String>,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn RecordStore>, failing: &[&str]) -> Self {
        Self {
            inner,
            failing: failing.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn check(&self, op: &str, collection: &str) -> Result<()> {
        let call = format!("{} {}", op, collection);
        if self.failing.contains(&call) {
            return Err(anyhow::anyhow!("{} refused by 10.0.0.7:27017", call));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn count(&self, collection: &str, filter: &FilterSpec) -> Result<usize> {
        self.check("count", collection)?;
        self.inner.count(collection, filter).await
    }

    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Record>> {
        self.check("find", collection)?;
        self.inner.find(collection, query).await
    }

    async fn find_by_id(&self, collection: &str, id: &Uuid) -> Result<Option<Record>> {
        self.check("find_by_id", collection)?;
        self.inner.find_by_id(collection, id).await
    }

    async fn insert(&self, collection: &str, record: Record) -> Result<Record> {
        self.check("insert", collection)?;
        self.inner.insert(collection, record).await
    }

    async fn update(&self, collection: &str, id: &Uuid, fields: Map<String, Value>) -> Result<bool> {
        self.check("update", collection)?;
        self.inner.update(collection, id, fields).await
    }

    async fn remove(&self, collection: &str, id: &Uuid) -> Result<()> {
        self.check("remove", collection)?;
        self.inner.remove(collection, id).await
    }
}
