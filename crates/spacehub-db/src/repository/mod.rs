//! SurrealDB repository implementations.
//!
//! Every repository holds a [`DbPool`](crate::DbPool) and checks out
//! exactly one connection per operation. A repository method never
//! holds a checkout while acquiring another one.

mod membership;
mod organization;
mod refresh_token;
mod space;
mod user;

pub use membership::SurrealMembershipRepository;
pub use organization::SurrealOrganizationRepository;
pub use refresh_token::SurrealRefreshTokenRepository;
pub use space::SurrealSpaceRepository;
pub use user::SurrealUserRepository;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Parse a UUID stored as a string column.
pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt(format!("invalid {what} UUID: {e}")))
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}
