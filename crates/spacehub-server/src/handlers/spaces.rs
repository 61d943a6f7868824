//! Tenant-scoped space handlers. Every call runs against the namespace
//! resolved for the request.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use spacehub_core::models::space::{CreateSpace, Space};
use spacehub_core::repository::SpaceRepository;

use crate::error::ApiResult;
use crate::middleware::CurrentTenant;
use crate::state::AppState;

pub async fn list_spaces(
    State(state): State<Arc<AppState>>,
    CurrentTenant(ctx): CurrentTenant,
) -> ApiResult<Json<Vec<Space>>> {
    Ok(Json(state.spaces.list(&ctx.namespace).await?))
}

pub async fn create_space(
    State(state): State<Arc<AppState>>,
    CurrentTenant(ctx): CurrentTenant,
    Json(req): Json<CreateSpace>,
) -> ApiResult<(StatusCode, Json<Space>)> {
    let space = state.spaces.create(&ctx.namespace, req).await?;
    Ok((StatusCode::CREATED, Json(space)))
}
