//! SurrealDB implementation of [`RefreshTokenRepository`].
//!
//! Only SHA-256 hashes of refresh tokens are stored. Rotation revokes
//! the presented record and persists its replacement in one
//! transaction, conditioned on the old record still being usable, so
//! two concurrent rotations of the same token cannot both succeed.

use chrono::{DateTime, Utc};
use spacehub_core::error::{HubError, HubResult};
use spacehub_core::models::refresh_token::{CreateRefreshToken, RefreshToken};
use spacehub_core::repository::RefreshTokenRepository;
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use tracing::{debug, warn};
use uuid::Uuid;

use super::parse_uuid;
use crate::connection::DbPool;
use crate::error::DbError;

const ROTATE: &str = "\
BEGIN TRANSACTION;
LET $old = (SELECT VALUE id FROM refresh_token \
    WHERE token_hash = $old_hash AND revoked = false AND expires_at > time::now());
IF array::len($old) = 0 { THROW 'refresh token is no longer usable' };
UPDATE $old SET revoked = true, revoked_at = time::now(), replaced_by = $new_id;
CREATE type::record('refresh_token', $new_id) SET \
    jti = $jti, \
    token_hash = $token_hash, \
    user_id = $user_id, \
    expires_at = $expires_at, \
    revoked = false;
COMMIT TRANSACTION;
";

#[derive(Debug, SurrealValue)]
struct RefreshTokenRowWithId {
    record_id: String,
    jti: String,
    token_hash: String,
    user_id: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    replaced_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl RefreshTokenRowWithId {
    fn try_into_token(self) -> Result<RefreshToken, DbError> {
        let replaced_by = self
            .replaced_by
            .as_deref()
            .map(|raw| parse_uuid(raw, "replacement token"))
            .transpose()?;
        Ok(RefreshToken {
            id: parse_uuid(&self.record_id, "refresh token")?,
            jti: parse_uuid(&self.jti, "jti")?,
            token_hash: self.token_hash,
            user_id: parse_uuid(&self.user_id, "user")?,
            expires_at: self.expires_at,
            revoked: self.revoked,
            revoked_at: self.revoked_at,
            replaced_by,
            created_at: self.created_at,
        })
    }
}

/// Rows touched by an UPDATE/DELETE; only used for counting.
#[derive(Debug, SurrealValue)]
struct TouchedRow {
    token_hash: String,
}

/// SurrealDB implementation of the RefreshToken repository.
#[derive(Clone)]
pub struct SurrealRefreshTokenRepository<C: Connection> {
    pool: DbPool<C>,
}

impl<C: Connection> SurrealRefreshTokenRepository<C> {
    pub fn new(pool: DbPool<C>) -> Self {
        Self { pool }
    }
}

impl<C: Connection> SurrealRefreshTokenRepository<C> {
    async fn find_by_hash(&self, token_hash: &str) -> HubResult<Option<RefreshToken>> {
        let conn = self.pool.identity().await?;
        let mut result = conn
            .query(
                "SELECT meta::id(id) AS record_id, * FROM refresh_token \
                 WHERE token_hash = $token_hash",
            )
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RefreshTokenRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_token().map_err(Into::into))
            .transpose()
    }

    async fn find_by_id(&self, id: &str) -> HubResult<RefreshToken> {
        let conn = self.pool.identity().await?;
        let mut result = conn
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('refresh_token', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RefreshTokenRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| HubError::not_found("refresh_token", id))?;

        Ok(row.try_into_token()?)
    }

    /// Explain why a rotation of `old_hash` did not commit.
    async fn rotation_failure(&self, old_hash: &str, cause: String) -> HubError {
        match self.find_by_hash(old_hash).await {
            Ok(None) => HubError::TokenNotFound,
            Ok(Some(record)) if record.revoked => HubError::RevokedToken,
            Ok(Some(record)) if record.expires_at <= Utc::now() => HubError::ExpiredToken,
            Ok(Some(_)) => {
                warn!(error = %cause, "Refresh token rotation failed");
                HubError::Database(cause)
            }
            Err(e) => e,
        }
    }
}

impl<C: Connection> RefreshTokenRepository for SurrealRefreshTokenRepository<C> {
    async fn create(&self, input: CreateRefreshToken) -> HubResult<RefreshToken> {
        let id = Uuid::new_v4().to_string();

        {
            let conn = self.pool.identity().await?;
            conn.query(
                "CREATE type::record('refresh_token', $id) SET \
                 jti = $jti, \
                 token_hash = $token_hash, \
                 user_id = $user_id, \
                 expires_at = $expires_at, \
                 revoked = false",
            )
            .bind(("id", id.clone()))
            .bind(("jti", input.jti.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;
        }

        self.find_by_id(&id).await
    }

    async fn get_by_hash(&self, token_hash: &str) -> HubResult<RefreshToken> {
        self.find_by_hash(token_hash)
            .await?
            .ok_or(HubError::TokenNotFound)
    }

    async fn rotate(
        &self,
        old_hash: &str,
        replacement: CreateRefreshToken,
    ) -> HubResult<RefreshToken> {
        let new_id = Uuid::new_v4().to_string();

        let outcome = {
            let conn = self.pool.identity().await?;
            conn.query(ROTATE)
                .bind(("old_hash", old_hash.to_string()))
                .bind(("new_id", new_id.clone()))
                .bind(("jti", replacement.jti.to_string()))
                .bind(("token_hash", replacement.token_hash))
                .bind(("user_id", replacement.user_id.to_string()))
                .bind(("expires_at", replacement.expires_at))
                .await
                .map_err(DbError::from)?
                .check()
                .map(drop)
        };

        if let Err(e) = outcome {
            return Err(self.rotation_failure(old_hash, e.to_string()).await);
        }

        debug!(replacement = %new_id, "Refresh token rotated");
        self.find_by_id(&new_id).await
    }

    async fn revoke(&self, token_hash: &str) -> HubResult<bool> {
        let conn = self.pool.identity().await?;
        let mut result = conn
            .query(
                "UPDATE refresh_token SET revoked = true, revoked_at = time::now() \
                 WHERE token_hash = $token_hash AND revoked = false",
            )
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TouchedRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn revoke_all_for_user(&self, user_id: Uuid) -> HubResult<u64> {
        let conn = self.pool.identity().await?;
        let mut result = conn
            .query(
                "UPDATE refresh_token SET revoked = true, revoked_at = time::now() \
                 WHERE user_id = $user_id AND revoked = false",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TouchedRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }

    async fn purge_expired(&self) -> HubResult<u64> {
        let conn = self.pool.identity().await?;
        let mut result = conn
            .query("DELETE refresh_token WHERE expires_at < time::now() RETURN BEFORE")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TouchedRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}
