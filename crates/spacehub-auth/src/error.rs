//! Authentication error types.

use spacehub_core::error::HubError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("wrong token type: expected {expected}, got {found}")]
    WrongTokenType { expected: String, found: String },

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for HubError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => HubError::InvalidCredentials,
            AuthError::AccountInactive => HubError::InactiveUser,
            AuthError::TokenExpired => HubError::ExpiredToken,
            AuthError::TokenInvalid(reason) => HubError::InvalidToken(reason),
            AuthError::WrongTokenType { expected, found } => {
                HubError::WrongTokenType { expected, found }
            }
            AuthError::WeakPassword { .. } => HubError::Validation {
                message: err.to_string(),
            },
            AuthError::Config(msg) => HubError::Internal(msg),
            AuthError::Crypto(msg) => HubError::Crypto(msg),
        }
    }
}
