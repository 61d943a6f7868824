//! Database-specific error types and conversions.

use spacehub_core::error::HubError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Connection pool is closed")]
    PoolClosed,

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for HubError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => HubError::NotFound { entity, id },
            other => HubError::Database(other.to_string()),
        }
    }
}

/// Unique index names whose violation maps to a domain error.
pub(crate) const IDX_USER_EMAIL: &str = "idx_user_email";
pub(crate) const IDX_ORGANIZATION_SLUG: &str = "idx_organization_slug";
pub(crate) const IDX_ORGANIZATION_NAMESPACE: &str = "idx_organization_namespace";
pub(crate) const IDX_MEMBERSHIP_PAIR: &str = "idx_membership_user_org";

/// Translate a failed write into a domain error when it was caused by
/// one of the identity unique indexes.
pub(crate) fn classify_write_error(message: String) -> HubError {
    if message.contains(IDX_USER_EMAIL) {
        HubError::DuplicateEmail
    } else if message.contains(IDX_ORGANIZATION_SLUG)
        || message.contains(IDX_ORGANIZATION_NAMESPACE)
    {
        HubError::DuplicateSlug
    } else if message.contains(IDX_MEMBERSHIP_PAIR) {
        HubError::AlreadyMember
    } else {
        DbError::Query(message).into()
    }
}
