//! API route definitions.

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, health, orgs, spaces};
use crate::middleware::tenant_middleware;
use crate::state::AppState;

/// Build the router. Tenant resolution runs in front of every route;
/// public paths pass through it untouched.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Organizations
        .route(
            "/orgs",
            get(orgs::list_organizations).post(orgs::create_organization),
        )
        // One parameter name per segment: slug on reads, id on invite.
        .route("/orgs/{org}", get(orgs::get_organization))
        .route("/orgs/{org}/invite", post(orgs::invite_member))
        // Tenant data
        .route(
            "/spaces",
            get(spaces::list_spaces).post(spaces::create_space),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tenant_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
