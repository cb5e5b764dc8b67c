//! # orgdesk
//!
//! A permission-gated administration service for an organisation's
//! announcements, departments and staff.
//!
//! ## Features
//!
//! - **Capability Gate**: every listing and page checks `(resource, action)`
//!   against an immutable role table before touching storage
//! - **Declarative Listings**: recognized filter parameters, page size, sort,
//!   native expansion and per-record relation lookups declared once per listing
//! - **Paginated Windows**: total count, page count and a bounded window of
//!   page links computed from the request's `p` parameter
//! - **Concurrent Relations**: per-record secondary lookups run concurrently
//!   and are attached by record id
//! - **Pluggable Storage**: in-memory store by default, MongoDB behind the
//!   `mongodb_backend` feature
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orgdesk::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     ServerBuilder::new()
//!         .with_store(InMemoryRecordStore::new())
//!         .with_config(AdminConfig::default_config())
//!         .serve("127.0.0.1:3000")
//!         .await
//! }
//! ```

pub mod admin;
pub mod config;
pub mod core;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        Action, AdminError, Capability, FilterSpec, FindQuery, GateDecision, ListingDefinition,
        ListingPipeline, ListingStage, PageResult, PageWindow, Paginator, PermissionGate,
        PipelineFailure, Populate, Principal, PrincipalResolver, Record, RecordStore,
        RelationLink, RelationResolver, Resource, RoleCapabilityMap, SortSpec,
        StorePrincipalResolver, auth::SESSION_HEADER,
    };

    // === Admin ===
    pub use crate::admin::Listings;

    // === Storage ===
    pub use crate::storage::InMemoryRecordStore;
    #[cfg(feature = "mongodb_backend")]
    pub use crate::storage::MongoRecordStore;

    // === Config ===
    pub use crate::config::{AdminConfig, ListingConfig, ListingsConfig};

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
