//! Organization membership handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use spacehub_auth::InviteOutcome;
use spacehub_core::models::membership::{MemberRole, MembershipWithOrganization};
use spacehub_core::models::organization::Organization;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::middleware::CurrentTenant;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
    #[serde(default = "default_role")]
    pub role: MemberRole,
}

fn default_role() -> MemberRole {
    MemberRole::Member
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
    CurrentTenant(ctx): CurrentTenant,
) -> ApiResult<Json<Vec<MembershipWithOrganization>>> {
    Ok(Json(state.guard.list_memberships(ctx.user_id).await?))
}

pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    CurrentTenant(ctx): CurrentTenant,
    Json(req): Json<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<MembershipWithOrganization>)> {
    let created = state
        .guard
        .create_organization(ctx.user_id, &req.name, &req.slug)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    CurrentTenant(ctx): CurrentTenant,
    Path(slug): Path<String>,
) -> ApiResult<Json<Organization>> {
    Ok(Json(
        state
            .guard
            .get_organization_for_member(&slug, ctx.user_id)
            .await?,
    ))
}

pub async fn invite_member(
    State(state): State<Arc<AppState>>,
    CurrentTenant(ctx): CurrentTenant,
    Path(org_id): Path<Uuid>,
    Json(req): Json<InviteRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let outcome = state
        .guard
        .invite(org_id, ctx.user_id, &req.email, req.role)
        .await?;
    let message = match outcome {
        InviteOutcome::Added(_) => "User added to organization",
        InviteOutcome::Deferred { .. } => "Invitation sent (simulated)",
    };
    Ok(Json(MessageResponse {
        message: message.into(),
    }))
}
