//! # Cohort Server
//!
//! HTTP/JSON front end for the Cohort identity service. Every route is a thin
//! adapter over [`cohort_core::IdentityService`]: it decodes the body, lifts
//! the `authorization` header into call metadata, and renders failures as the
//! `{"error": {...}}` envelope.

pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

/// Assemble the full router: health check plus the versioned API.
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route(routes::HEALTH, get(health))
        .merge(routes::create_api_router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.app_name(),
    }))
}
