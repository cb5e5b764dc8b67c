//! ServerBuilder for fluent API to build HTTP servers

use super::router::{build_admin_routes, health_routes, not_found};
use super::state::AppState;
use crate::config::AdminConfig;
use crate::core::auth::PrincipalResolver;
use crate::core::store::RecordStore;
use anyhow::{Result, anyhow};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Builder for the administration server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_store(InMemoryRecordStore::new())
///     .with_config(AdminConfig::from_yaml_file("orgdesk.yaml")?)
///     .build()?;
/// ```
pub struct ServerBuilder {
    store: Option<Arc<dyn RecordStore>>,
    config: Option<AdminConfig>,
    principals: Option<Arc<dyn PrincipalResolver>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Create a new ServerBuilder
    pub fn new() -> Self {
        Self {
            store: None,
            config: None,
            principals: None,
            custom_routes: Vec::new(),
        }
    }

    /// Set the record store (required)
    pub fn with_store(mut self, store: impl RecordStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Set an already shared record store (required unless `with_store` is used)
    pub fn with_shared_store(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the configuration; defaults to [`AdminConfig::default_config`]
    pub fn with_config(mut self, config: AdminConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the session-header principal resolver
    pub fn with_principal_resolver(mut self, resolver: impl PrincipalResolver + 'static) -> Self {
        self.principals = Some(Arc::new(resolver));
        self
    }

    /// Add custom routes, such as a login page
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the application state
    pub fn build_state(&mut self) -> Result<AppState> {
        let store = self
            .store
            .clone()
            .ok_or_else(|| anyhow!("RecordStore is required. Call .with_store() first"))?;
        let config = self
            .config
            .take()
            .unwrap_or_else(AdminConfig::default_config);
        config.validate()?;

        Ok(match self.principals.clone() {
            Some(principals) => AppState::with_principal_resolver(store, &config, principals),
            None => AppState::new(store, &config),
        })
    }

    /// Build the final router
    pub fn build(mut self) -> Result<Router> {
        let state = self.build_state()?;

        let mut app = health_routes().merge(build_admin_routes(state));
        for routes in std::mem::take(&mut self.custom_routes) {
            app = app.merge(routes);
        }

        Ok(app.fallback(not_found).layer(TraceLayer::new_for_http()))
    }

    /// Serve the application with graceful shutdown
    ///
    /// Binds to `addr` and handles SIGTERM and SIGINT (Ctrl+C).
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
