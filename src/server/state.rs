//! Shared state handed to every handler

use crate::admin::Listings;
use crate::config::AdminConfig;
use crate::core::auth::{
    Action, PermissionGate, Principal, PrincipalResolver, Resource, StorePrincipalResolver,
};
use crate::core::error::AdminError;
use crate::core::pipeline::ListingPipeline;
use crate::core::store::RecordStore;
use axum::http::HeaderMap;
use std::sync::Arc;

/// Application state: storage, gate, pipeline and listing declarations
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub gate: PermissionGate,
    pub pipeline: ListingPipeline,
    pub principals: Arc<dyn PrincipalResolver>,
    pub listings: Arc<Listings>,
}

impl AppState {
    /// State resolving principals from the store's users collection
    pub fn new(store: Arc<dyn RecordStore>, config: &AdminConfig) -> Self {
        let principals = Arc::new(StorePrincipalResolver::new(store.clone()));
        Self::with_principal_resolver(store, config, principals)
    }

    pub fn with_principal_resolver(
        store: Arc<dyn RecordStore>,
        config: &AdminConfig,
        principals: Arc<dyn PrincipalResolver>,
    ) -> Self {
        let gate = PermissionGate::new(config.role_capabilities());
        Self {
            pipeline: ListingPipeline::new(gate.clone(), store.clone()),
            gate,
            store,
            principals,
            listings: Arc::new(Listings::from_config(&config.listings)),
        }
    }

    /// Principal issuing the request, if any
    pub async fn principal(&self, headers: &HeaderMap) -> Result<Option<Principal>, AdminError> {
        self.principals
            .resolve(headers)
            .await
            .map_err(AdminError::data_source)
    }

    /// Resolve the principal and check it holds `(resource, action)`
    pub async fn authorize(
        &self,
        headers: &HeaderMap,
        resource: Resource,
        action: Action,
    ) -> Result<Principal, AdminError> {
        let principal = self.principal(headers).await?;
        self.gate
            .authorize(principal.as_ref(), resource, action)
            .cloned()
    }
}
