//! Per-request tenant resolution.
//!
//! For every path outside the public allow-list the bearer token is
//! verified, its `tenant_id` resolved to an active organization, and
//! the outcome stored in request extensions. Handlers obtain the
//! namespace only through [`CurrentTenant`], and every tenant-scoped
//! repository call checks out a connection bound to that namespace.
//! A presented token that fails verification ends the request with
//! 401; it is never downgraded to an anonymous request.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use spacehub_core::HubError;
use spacehub_core::namespace::NamespaceName;
use spacehub_core::repository::OrganizationRepository;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Exact paths served without tenant resolution.
pub const PUBLIC_PATHS: &[&str] = &[
    "/",
    "/health",
    "/docs",
    "/openapi.json",
    "/auth/login",
    "/auth/register",
    "/auth/refresh",
];

pub fn is_public(path: &str) -> bool {
    PUBLIC_PATHS.contains(&path)
}

/// Identity and namespace bound to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub namespace: NamespaceName,
}

/// Result of resolving a request's credentials.
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// No bearer credentials were presented.
    Anonymous,
    Authenticated(TenantContext),
    /// Credentials were presented and failed.
    Rejected { reason: String },
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

/// Resolve the caller behind `headers`.
///
/// Errors are infrastructure failures; authentication failures are
/// reported as [`AuthOutcome::Rejected`].
pub async fn resolve(state: &AppState, headers: &HeaderMap) -> Result<AuthOutcome, HubError> {
    let Some(header) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) else {
        return Ok(AuthOutcome::Anonymous);
    };
    let Some(token) = extract_bearer_token(header) else {
        return Ok(AuthOutcome::Anonymous);
    };

    let identity = match state.auth.verify_access(token) {
        Ok(identity) => identity,
        Err(e) => {
            return Ok(AuthOutcome::Rejected {
                reason: e.to_string(),
            });
        }
    };

    let organization = match state.organizations.get_by_id(identity.tenant_id).await {
        Ok(org) if org.is_active => org,
        Ok(_) | Err(HubError::NotFound { .. }) => {
            return Ok(AuthOutcome::Rejected {
                reason: HubError::TenantNotFound.to_string(),
            });
        }
        Err(e) => return Err(e),
    };

    Ok(AuthOutcome::Authenticated(TenantContext {
        user_id: identity.user_id,
        tenant_id: organization.id,
        namespace: organization.namespace,
    }))
}

/// Tenant resolution middleware.
pub async fn tenant_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if is_public(request.uri().path()) {
        return next.run(request).await;
    }

    let outcome = match resolve(&state, request.headers()).await {
        Ok(outcome) => outcome,
        Err(e) => return ApiError::from(e).into_response(),
    };

    match &outcome {
        AuthOutcome::Rejected { reason } => {
            warn!(path = %request.uri().path(), reason = %reason, "Rejected credentials");
            return ApiError::Unauthorized(reason.clone()).into_response();
        }
        AuthOutcome::Authenticated(ctx) => {
            debug!(user_id = %ctx.user_id, namespace = %ctx.namespace, "Tenant resolved");
        }
        AuthOutcome::Anonymous => {}
    }

    request.extensions_mut().insert(outcome);
    next.run(request).await
}

/// Extractor for the authenticated caller and their tenant namespace.
#[derive(Debug, Clone)]
pub struct CurrentTenant(pub TenantContext);

impl<S> FromRequestParts<S> for CurrentTenant
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthOutcome>() {
            Some(AuthOutcome::Authenticated(ctx)) => Ok(CurrentTenant(ctx.clone())),
            Some(AuthOutcome::Anonymous) | Some(AuthOutcome::Rejected { .. }) | None => {
                Err(ApiError::Unauthorized("Not authenticated".into()))
            }
        }
    }
}
