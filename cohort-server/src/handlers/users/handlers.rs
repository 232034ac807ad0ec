use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use cohort_core::{
    identity::{LoginRequest, RegisterRequest, UpdateRequest},
    token::SessionToken,
};
use cohort_model::UserProfile;

use super::Metadata;
use crate::infra::{app_state::AppState, errors::AppResult};

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let Json(request) = payload?;
    let profile = state.identity().register(request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<SessionToken>> {
    let Json(request) = payload?;
    let token = state.identity().login(request).await?;
    Ok(Json(token))
}

pub async fn get_me(
    State(state): State<AppState>,
    Metadata(metadata): Metadata,
) -> AppResult<Json<UserProfile>> {
    let profile = state.identity().get(&metadata).await?;
    Ok(Json(profile))
}

pub async fn update_me(
    State(state): State<AppState>,
    Metadata(metadata): Metadata,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> AppResult<Json<UserProfile>> {
    // Authorization is judged before the body, so an anonymous caller with a
    // malformed body still sees UNAUTHENTICATED.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            state.identity().get(&metadata).await?;
            return Err(rejection.into());
        }
    };
    let profile = state.identity().update(&metadata, request).await?;
    Ok(Json(profile))
}
