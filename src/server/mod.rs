//! Server module: application state, routing and the HTTP server builder

pub mod builder;
pub mod router;
pub mod state;

pub use builder::ServerBuilder;
pub use router::build_admin_routes;
pub use state::AppState;
