//! Registration, login, token refresh and logout handlers.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use spacehub_auth::{RegisterInput, TokenPair};
use spacehub_core::models::user::User;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::CurrentTenant;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub organization_name: String,
    pub organization_slug: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
    /// Organization the new access token should target, if the caller
    /// is an active member there.
    pub organization_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenPair>)> {
    let pair = state
        .auth
        .register(RegisterInput {
            email: req.email,
            password: req.password,
            full_name: req.full_name,
            organization_name: req.organization_name,
            organization_slug: req.organization_slug,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    Ok(Json(state.auth.login(&req.email, &req.password).await?))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    CurrentTenant(ctx): CurrentTenant,
) -> ApiResult<Json<User>> {
    Ok(Json(state.auth.me(ctx.user_id).await?))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let pair = state
        .auth
        .refresh(&req.refresh_token, req.organization_id)
        .await?;
    Ok(Json(pair))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentTenant(_): CurrentTenant,
    Json(req): Json<LogoutRequest>,
) -> ApiResult<StatusCode> {
    state.auth.logout(&req.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}
