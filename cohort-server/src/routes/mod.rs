pub mod v1;

use axum::Router;

use crate::AppState;

pub const HEALTH: &str = "/health";

/// Create the main API router with all versions
pub fn create_api_router() -> Router<AppState> {
    Router::new().nest(v1::PREFIX, v1::create_v1_router())
}
