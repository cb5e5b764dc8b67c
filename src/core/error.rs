//! Typed error handling for orgdesk
//!
//! [`AdminError`] is the taxonomy every handler and the listing pipeline
//! report in. Each variant maps to exactly one HTTP outcome:
//!
//! - `Unauthenticated` → redirect to the login page
//! - `Forbidden` → 403
//! - `NotFound` → 404
//! - `Validation` → 400
//! - `DataSource`, `RelationResolution`, `Config` → generic 500
//!
//! # Example
//!
//! ```rust,ignore
//! let news = store
//!     .find_by_id("news", &id)
//!     .await
//!     .map_err(AdminError::data_source)?
//!     .ok_or(AdminError::NotFound { resource: Resource::News, id })?;
//! ```

use crate::core::auth::{Action, Resource};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Where unauthenticated requests are sent
pub const LOGIN_PATH: &str = "/login";

/// The main error type for orgdesk
#[derive(Debug)]
pub enum AdminError {
    /// No valid session on the request
    Unauthenticated,

    /// The principal's role lacks the capability
    Forbidden { resource: Resource, action: Action },

    /// A direct single-record lookup came back empty
    NotFound { resource: Resource, id: Uuid },

    /// A storage engine call failed
    DataSource { message: String },

    /// A secondary per-record lookup failed
    RelationResolution { relation: String, message: String },

    /// Malformed request input
    Validation { field: String, message: String },

    /// Invalid configuration
    Config(ConfigError),
}

impl AdminError {
    /// Wrap a storage failure
    pub fn data_source(err: anyhow::Error) -> Self {
        AdminError::DataSource {
            message: format!("{:#}", err),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AdminError::Unauthenticated => StatusCode::SEE_OTHER,
            AdminError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AdminError::NotFound { .. } => StatusCode::NOT_FOUND,
            AdminError::Validation { .. } => StatusCode::BAD_REQUEST,
            AdminError::DataSource { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::RelationResolution { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AdminError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AdminError::Unauthenticated => "UNAUTHENTICATED",
            AdminError::Forbidden { .. } => "FORBIDDEN",
            AdminError::NotFound { .. } => "NOT_FOUND",
            AdminError::Validation { .. } => "VALIDATION_ERROR",
            AdminError::DataSource { .. } => "DATA_SOURCE_ERROR",
            AdminError::RelationResolution { .. } => "RELATION_RESOLUTION_ERROR",
            AdminError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether the details are safe to show to the caller
    fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        let message = if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        ErrorResponse {
            code: self.error_code().to_string(),
            message,
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AdminError::Forbidden { resource, action } => Some(serde_json::json!({
                "resource": resource,
                "action": action,
            })),
            AdminError::NotFound { resource, id } => Some(serde_json::json!({
                "resource": resource,
                "id": id.to_string(),
            })),
            AdminError::Validation { field, .. } => Some(serde_json::json!({ "field": field })),
            _ => None,
        }
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::Unauthenticated => write!(f, "Authentication required"),
            AdminError::Forbidden { resource, action } => {
                write!(f, "Not allowed to {} {}", action, resource)
            }
            AdminError::NotFound { resource, id } => {
                write!(f, "{} with id '{}' not found", resource, id)
            }
            AdminError::DataSource { message } => write!(f, "Data source error: {}", message),
            AdminError::RelationResolution { relation, message } => {
                write!(f, "Failed to resolve relation '{}': {}", relation, message)
            }
            AdminError::Validation { field, message } => {
                write!(f, "Validation error for field '{}': {}", field, message)
            }
            AdminError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for AdminError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AdminError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for AdminError {
    fn from(err: ConfigError) -> Self {
        AdminError::Config(err)
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        if let AdminError::Unauthenticated = self {
            return Redirect::to(LOGIN_PATH).into_response();
        }

        if self.is_internal() {
            tracing::error!(error = %self, code = self.error_code(), "request failed");
        }

        let status = self.status_code();
        (status, Json(self.to_response())).into_response()
    }
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AdminError::Unauthenticated.status_code(),
            StatusCode::SEE_OTHER
        );
        assert_eq!(
            AdminError::Forbidden {
                resource: Resource::Department,
                action: Action::Modify
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AdminError::NotFound {
                resource: Resource::News,
                id: Uuid::new_v4()
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AdminError::RelationResolution {
                relation: "master".to_string(),
                message: "timeout".to_string()
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AdminError::DataSource {
            message: "connection refused to 10.0.0.3".to_string(),
        };
        let body = err.to_response();
        assert_eq!(body.code, "DATA_SOURCE_ERROR");
        assert!(!body.message.contains("10.0.0.3"));
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let response = AdminError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").unwrap(),
            LOGIN_PATH
        );
    }

    #[test]
    fn test_not_found_details() {
        let id = Uuid::new_v4();
        let body = AdminError::NotFound {
            resource: Resource::Employee,
            id,
        }
        .to_response();
        let details = body.details.unwrap();
        assert_eq!(details["resource"], "employee");
        assert_eq!(details["id"], id.to_string());
    }
}
