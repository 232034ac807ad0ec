use axum::{
    Router,
    routing::{get, post},
};

use crate::{AppState, handlers::users};

pub const PREFIX: &str = "/api/v1";

pub const REGISTER: &str = "/api/v1/users/register";
pub const LOGIN: &str = "/api/v1/users/login";
pub const ME: &str = "/api/v1/users/me";

/// Create all v1 API routes
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(users::handlers::register))
        .route("/users/login", post(users::handlers::login))
        .route(
            "/users/me",
            get(users::handlers::get_me).patch(users::handlers::update_me),
        )
}
