//! Error types for the SpaceHub system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Incorrect email or password")]
    InvalidCredentials,

    #[error("Inactive user")]
    InactiveUser,

    #[error("User has no active organization memberships")]
    NoActiveMembership,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Wrong token type: expected {expected}, got {found}")]
    WrongTokenType { expected: String, found: String },

    #[error("Refresh token not found")]
    TokenNotFound,

    #[error("Tenant not found")]
    TenantNotFound,

    #[error("Organization slug already taken")]
    DuplicateSlug,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("User is already a member")]
    AlreadyMember,

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Namespace provisioning failed: {0}")]
    Provisioning(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HubError {
    /// Shorthand for a [`HubError::NotFound`] on `entity`.
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Whether this error means the caller failed to authenticate.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::InvalidToken(_)
                | Self::ExpiredToken
                | Self::RevokedToken
                | Self::WrongTokenType { .. }
                | Self::TokenNotFound
                | Self::TenantNotFound
        )
    }
}

pub type HubResult<T> = Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_are_authentication_failures() {
        assert!(HubError::ExpiredToken.is_authentication_failure());
        assert!(HubError::RevokedToken.is_authentication_failure());
        assert!(HubError::TenantNotFound.is_authentication_failure());
        assert!(HubError::InvalidToken("bad".into()).is_authentication_failure());
    }

    #[test]
    fn authorization_errors_are_not_authentication_failures() {
        assert!(!HubError::InactiveUser.is_authentication_failure());
        assert!(!HubError::AlreadyMember.is_authentication_failure());
        assert!(
            !HubError::Forbidden {
                reason: "nope".into()
            }
            .is_authentication_failure()
        );
    }
}
