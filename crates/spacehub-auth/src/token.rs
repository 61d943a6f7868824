//! HS256 JWT issuance and verification for access and refresh tokens.
//!
//! Access tokens are stateless. Refresh tokens also carry a `jti` and
//! are mirrored server-side by a record keyed on the SHA-256 of the
//! raw token, which is what rotation and revocation operate on.

use std::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use spacehub_core::models::refresh_token::CreateRefreshToken;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims shared by both token types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: user ID (UUID string).
    pub sub: String,
    /// Organization the access token is bound to. Access tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Unique token ID. Refresh tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Claims of a token whose signature, expiry and type were checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub jti: Option<Uuid>,
    pub expires_at: i64,
}

/// A freshly signed refresh token and the record that must be stored
/// for it.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub token: String,
    pub record: CreateRefreshToken,
}

fn encode(claims: &TokenClaims, config: &AuthConfig) -> Result<String, AuthError> {
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Issue a signed HS256 access token bound to `tenant_id`.
pub fn issue_access_token(
    user_id: Uuid,
    tenant_id: Uuid,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        tenant_id: Some(tenant_id.to_string()),
        token_type: TokenType::Access,
        jti: None,
        iat: now,
        exp: now + config.access_token_lifetime_secs as i64,
    };
    encode(&claims, config)
}

/// Issue a signed HS256 refresh token together with its storage record
/// (same `jti`, same expiry).
pub fn issue_refresh_token(
    user_id: Uuid,
    config: &AuthConfig,
) -> Result<IssuedRefreshToken, AuthError> {
    let now = Utc::now().timestamp();
    let exp = now + config.refresh_token_lifetime_secs as i64;
    let jti = Uuid::new_v4();
    let claims = TokenClaims {
        sub: user_id.to_string(),
        tenant_id: None,
        token_type: TokenType::Refresh,
        jti: Some(jti.to_string()),
        iat: now,
        exp,
    };
    let token = encode(&claims, config)?;

    let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)
        .ok_or_else(|| AuthError::Crypto(format!("expiry out of range: {exp}")))?;

    Ok(IssuedRefreshToken {
        record: CreateRefreshToken {
            jti,
            token_hash: hash_token(&token),
            user_id,
            expires_at,
        },
        token,
    })
}

fn parse_claim(raw: &str, claim: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(raw).map_err(|_| AuthError::TokenInvalid(format!("malformed {claim} claim")))
}

/// Verify signature, expiry and type of `token`.
///
/// Access tokens must carry `tenant_id`; refresh tokens must carry
/// `jti`.
pub fn verify(
    token: &str,
    expected: TokenType,
    config: &AuthConfig,
) -> Result<VerifiedToken, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["sub", "exp", "iat"]);

    let claims = jsonwebtoken::decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })?;

    if claims.token_type != expected {
        return Err(AuthError::WrongTokenType {
            expected: expected.to_string(),
            found: claims.token_type.to_string(),
        });
    }

    let user_id = parse_claim(&claims.sub, "sub")?;
    let tenant_id = claims
        .tenant_id
        .as_deref()
        .map(|raw| parse_claim(raw, "tenant_id"))
        .transpose()?;
    let jti = claims
        .jti
        .as_deref()
        .map(|raw| parse_claim(raw, "jti"))
        .transpose()?;

    match expected {
        TokenType::Access if tenant_id.is_none() => {
            Err(AuthError::TokenInvalid("missing tenant_id claim".into()))
        }
        TokenType::Refresh if jti.is_none() => {
            Err(AuthError::TokenInvalid("missing jti claim".into()))
        }
        _ => Ok(VerifiedToken {
            user_id,
            tenant_id,
            jti,
            expires_at: claims.exp,
        }),
    }
}

/// SHA-256 hash of a raw token, hex-encoded.
///
/// This is the value stored in `refresh_token.token_hash`.
pub fn hash_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}
