//! Router assembly for the administration endpoints

use super::state::AppState;
use crate::admin::{department, employee, news};
use crate::core::error::ErrorResponse;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

/// Build every administration route
///
/// - GET  /news, /news/{id}, /news/edit/{id}
/// - POST /news/create, /news/edit/{id}, /news/delete/{id}
/// - GET  /department, /department/{id}, /department/edit/{id}
/// - POST /department/create, /department/edit/{id}, /department/delete/{id}
/// - GET  /employee, /employee/{id}, /employee/cautioner/{id}, /employee/edit/{id}
/// - POST /employee/edit/{id}
pub fn build_admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/news", get(news::list))
        .route("/news/create", post(news::create))
        .route("/news/{id}", get(news::show))
        .route("/news/edit/{id}", get(news::edit_form).post(news::edit))
        .route("/news/delete/{id}", post(news::delete))
        .route("/department", get(department::list))
        .route("/department/create", post(department::create))
        .route("/department/{id}", get(department::show))
        .route(
            "/department/edit/{id}",
            get(department::edit_form).post(department::edit),
        )
        .route("/department/delete/{id}", post(department::delete))
        .route("/employee", get(employee::list))
        .route("/employee/{id}", get(employee::show))
        .route("/employee/cautioner/{id}", get(employee::show_cautioner))
        .route(
            "/employee/edit/{id}",
            get(employee::edit_form).post(employee::edit),
        )
        .with_state(state)
}

/// Health check routes
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Fallback for unknown routes
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            code: "NOT_FOUND".to_string(),
            message: "No such page".to_string(),
            details: None,
        }),
    )
}
