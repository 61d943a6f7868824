//! Integration tests for refresh token persistence and rotation.

use chrono::{Duration, Utc};
use spacehub_core::HubError;
use spacehub_core::models::refresh_token::CreateRefreshToken;
use spacehub_core::repository::RefreshTokenRepository;
use spacehub_db::repository::SurrealRefreshTokenRepository;
use spacehub_db::{DbPool, migrate};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> SurrealRefreshTokenRepository<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    let pool = DbPool::single(db, "test", "identity");
    migrate(&pool).await.unwrap();
    SurrealRefreshTokenRepository::new(pool)
}

fn token(user_id: Uuid, hash: &str, ttl: Duration) -> CreateRefreshToken {
    CreateRefreshToken {
        jti: Uuid::new_v4(),
        token_hash: hash.into(),
        user_id,
        expires_at: Utc::now() + ttl,
    }
}

#[tokio::test]
async fn create_and_lookup_by_hash() {
    let repo = setup().await;
    let user = Uuid::new_v4();

    let created = repo.create(token(user, "h1", Duration::days(7))).await.unwrap();
    assert!(!created.revoked);
    assert!(created.is_usable_at(Utc::now()));

    let found = repo.get_by_hash("h1").await.unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.user_id, user);
}

#[tokio::test]
async fn unknown_hash_is_token_not_found() {
    let repo = setup().await;
    let err = repo.get_by_hash("missing").await.unwrap_err();
    assert!(matches!(err, HubError::TokenNotFound));
}

#[tokio::test]
async fn rotation_revokes_old_and_links_replacement() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    repo.create(token(user, "old", Duration::days(7))).await.unwrap();

    let new = repo
        .rotate("old", token(user, "new", Duration::days(7)))
        .await
        .unwrap();
    assert_eq!(new.token_hash, "new");
    assert!(!new.revoked);

    let old = repo.get_by_hash("old").await.unwrap();
    assert!(old.revoked);
    assert!(old.revoked_at.is_some());
    assert_eq!(old.replaced_by, Some(new.id));
}

#[tokio::test]
async fn replaying_a_rotated_token_fails() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    repo.create(token(user, "old", Duration::days(7))).await.unwrap();
    repo.rotate("old", token(user, "new", Duration::days(7)))
        .await
        .unwrap();

    let err = repo
        .rotate("old", token(user, "other", Duration::days(7)))
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::RevokedToken), "got {err:?}");

    // The failed rotation wrote nothing.
    let err = repo.get_by_hash("other").await.unwrap_err();
    assert!(matches!(err, HubError::TokenNotFound));
}

#[tokio::test]
async fn expired_token_cannot_be_rotated() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    repo.create(token(user, "stale", Duration::seconds(-5)))
        .await
        .unwrap();

    let err = repo
        .rotate("stale", token(user, "fresh", Duration::days(7)))
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::ExpiredToken), "got {err:?}");
}

#[tokio::test]
async fn rotating_unknown_token_is_not_found() {
    let repo = setup().await;
    let err = repo
        .rotate("nope", token(Uuid::new_v4(), "fresh", Duration::days(7)))
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::TokenNotFound), "got {err:?}");
}

#[tokio::test]
async fn concurrent_rotations_have_exactly_one_winner() {
    // A pool of one runs these rotations back to back. Overlapping
    // rotations are covered by `concurrent_refresh_has_one_winner` in
    // spacehub-auth.
    let repo = setup().await;
    let user = Uuid::new_v4();
    repo.create(token(user, "shared", Duration::days(7)))
        .await
        .unwrap();

    let first = {
        let repo = repo.clone();
        tokio::spawn(async move {
            repo.rotate("shared", token(user, "winner-a", Duration::days(7)))
                .await
        })
    };
    let second = {
        let repo = repo.clone();
        tokio::spawn(async move {
            repo.rotate("shared", token(user, "winner-b", Duration::days(7)))
                .await
        })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "outcomes: {outcomes:?}");
    assert!(
        outcomes
            .iter()
            .any(|r| matches!(r, Err(HubError::RevokedToken)))
    );
}

#[tokio::test]
async fn revoke_is_reported_once() {
    let repo = setup().await;
    repo.create(token(Uuid::new_v4(), "h", Duration::days(7)))
        .await
        .unwrap();

    assert!(repo.revoke("h").await.unwrap());
    assert!(!repo.revoke("h").await.unwrap());
    assert!(!repo.revoke("unknown").await.unwrap());
}

#[tokio::test]
async fn revoke_all_only_touches_that_user() {
    let repo = setup().await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    repo.create(token(alice, "a1", Duration::days(7))).await.unwrap();
    repo.create(token(alice, "a2", Duration::days(7))).await.unwrap();
    repo.create(token(bob, "b1", Duration::days(7))).await.unwrap();

    assert_eq!(repo.revoke_all_for_user(alice).await.unwrap(), 2);
    assert!(repo.get_by_hash("a1").await.unwrap().revoked);
    assert!(!repo.get_by_hash("b1").await.unwrap().revoked);
}

#[tokio::test]
async fn purge_removes_only_expired_records() {
    let repo = setup().await;
    let user = Uuid::new_v4();
    repo.create(token(user, "live", Duration::days(7))).await.unwrap();
    repo.create(token(user, "dead", Duration::seconds(-5)))
        .await
        .unwrap();

    assert_eq!(repo.purge_expired().await.unwrap(), 1);
    assert!(repo.get_by_hash("live").await.is_ok());
    assert!(matches!(
        repo.get_by_hash("dead").await.unwrap_err(),
        HubError::TokenNotFound
    ));
}
