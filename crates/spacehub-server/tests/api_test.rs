//! End-to-end tests of the HTTP surface over an in-memory database.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use spacehub_auth::AuthConfig;
use spacehub_auth::token;
use spacehub_db::{DbConfig, DbPool, migrate};
use spacehub_server::{AppState, create_router};
use surrealdb::engine::any::Any;
use tower::ServiceExt;
use uuid::Uuid;

fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "api-test-secret-api-test-secret-0123".into(),
        ..Default::default()
    }
}

async fn app_with_pool() -> (Router, DbPool<Any>) {
    let pool = DbPool::connect(&DbConfig::default()).await.unwrap();
    migrate(&pool).await.unwrap();
    let router = create_router(Arc::new(AppState::new(pool.clone(), auth_config())));
    (router, pool)
}

async fn app() -> Router {
    app_with_pool().await.0
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Register an owner and return `(access_token, refresh_token)`.
async fn register(app: &Router, email: &str, slug: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": email,
            "password": "correct horse battery",
            "full_name": "Owner",
            "organization_name": format!("Org {slug}"),
            "organization_slug": slug,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["token_type"], "bearer");
    (
        body["access_token"].as_str().unwrap().to_owned(),
        body["refresh_token"].as_str().unwrap().to_owned(),
    )
}

#[tokio::test]
async fn public_endpoints_need_no_token() {
    let app = app().await;

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("SpaceHub"));
}

#[tokio::test]
async fn register_login_me_refresh_flow() {
    let app = app().await;
    let (access, refresh) = register(&app, "alice@acme.test", "acme").await;

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@acme.test");
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "alice@acme.test", "password": "wrong password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "alice@acme.test", "password": "correct horse battery" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, rotated) = send(
        &app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(rotated["refresh_token"].as_str().unwrap(), refresh);

    // The rotated-away token cannot be replayed.
    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_registration_is_a_bad_request() {
    let app = app().await;
    register(&app, "alice@acme.test", "acme").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "email": "alice@acme.test",
            "password": "correct horse battery",
            "organization_name": "Other",
            "organization_slug": "other",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn protected_routes_reject_missing_or_bad_tokens() {
    let app = app().await;

    let (status, _) = send(&app, Method::GET, "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/spaces", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stale_tenant_token_is_rejected() {
    let app = app().await;
    let access =
        token::issue_access_token(Uuid::new_v4(), Uuid::new_v4(), &auth_config()).unwrap();

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Tenant not found");
}

#[tokio::test]
async fn inactive_organization_token_is_rejected() {
    let (app, pool) = app_with_pool().await;
    let (access, _) = register(&app, "alice@acme.test", "acme").await;

    {
        let conn = pool.identity().await.unwrap();
        conn.query("UPDATE organization SET is_active = false WHERE slug = $slug")
            .bind(("slug", "acme"))
            .await
            .unwrap()
            .check()
            .unwrap();
    }

    let (status, body) = send(&app, Method::GET, "/spaces", Some(&access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Tenant not found");
}

#[tokio::test]
async fn expired_access_token_is_rejected() {
    let app = app().await;
    let (access, _) = register(&app, "alice@acme.test", "acme").await;
    let claims = token::verify(&access, token::TokenType::Access, &auth_config()).unwrap();

    let short_lived = AuthConfig {
        access_token_lifetime_secs: 1,
        ..auth_config()
    };
    let expiring =
        token::issue_access_token(claims.user_id, claims.tenant_id.unwrap(), &short_lived)
            .unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2100)).await;

    let (status, body) = send(&app, Method::GET, "/auth/me", Some(&expiring), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() {
    let app = app().await;
    let (_, refresh) = register(&app, "alice@acme.test", "acme").await;

    let (status, _) = send(&app, Method::GET, "/spaces", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn spaces_are_isolated_between_tenants() {
    let app = app().await;
    let (acme, _) = register(&app, "alice@acme.test", "acme").await;
    let (globex, _) = register(&app, "hank@globex.test", "globex").await;

    let (status, created) = send(
        &app,
        Method::POST,
        "/spaces",
        Some(&acme),
        Some(json!({
            "name": "Board Room",
            "space_type": "hourly",
            "capacity": 12,
            "price_per_unit": 40.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["is_available"], true);

    let (status, listed) = send(&app, Method::GET, "/spaces", Some(&acme), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, listed) = send(&app, Method::GET, "/spaces", Some(&globex), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invite_adds_existing_users_and_defers_unknown_ones() {
    let app = app().await;
    let (owner, _) = register(&app, "alice@acme.test", "acme").await;
    register(&app, "bob@initech.test", "initech").await;

    let (_, orgs) = send(&app, Method::GET, "/orgs", Some(&owner), None).await;
    let org_id = orgs[0]["organization"]["id"].as_str().unwrap().to_owned();
    let invite_uri = format!("/orgs/{org_id}/invite");

    let (status, body) = send(
        &app,
        Method::POST,
        &invite_uri,
        Some(&owner),
        Some(json!({ "email": "bob@initech.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User added to organization");

    let (status, _) = send(
        &app,
        Method::POST,
        &invite_uri,
        Some(&owner),
        Some(json!({ "email": "bob@initech.test", "role": "ADMIN" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        &invite_uri,
        Some(&owner),
        Some(json!({ "email": "nobody@nowhere.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Invitation sent (simulated)");
}

#[tokio::test]
async fn organizations_are_visible_to_members_only() {
    let app = app().await;
    let (alice, _) = register(&app, "alice@acme.test", "acme").await;
    let (hank, _) = register(&app, "hank@globex.test", "globex").await;

    let (status, body) = send(&app, Method::GET, "/orgs/acme", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["slug"], "acme");

    let (status, _) = send(&app, Method::GET, "/orgs/acme", Some(&hank), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/orgs/{}/invite", uuid_of(&app, &alice).await),
        Some(&hank),
        Some(json!({ "email": "hank@globex.test" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_can_create_a_second_organization() {
    let app = app().await;
    let (alice, _) = register(&app, "alice@acme.test", "acme").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/orgs",
        Some(&alice),
        Some(json!({ "name": "Acme East", "slug": "acme-east" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["role"], "OWNER");

    let (_, orgs) = send(&app, Method::GET, "/orgs", Some(&alice), None).await;
    assert_eq!(orgs.as_array().unwrap().len(), 2);

    let (status, _) = send(
        &app,
        Method::POST,
        "/orgs",
        Some(&alice),
        Some(json!({ "name": "Dup", "slug": "acme" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_revokes_the_refresh_token() {
    let app = app().await;
    let (access, refresh) = register(&app, "alice@acme.test", "acme").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/logout",
        Some(&access),
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/auth/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

/// Id of the first organization `token`'s holder belongs to.
async fn uuid_of(app: &Router, token: &str) -> String {
    let (_, orgs) = send(app, Method::GET, "/orgs", Some(token), None).await;
    orgs[0]["organization"]["id"].as_str().unwrap().to_owned()
}
