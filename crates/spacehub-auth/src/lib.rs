//! SpaceHub Auth: password hashing, JWT issuance/validation, refresh
//! token rotation, registration and the organization membership guard.

pub mod config;
pub mod error;
pub mod guard;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use guard::{InviteOutcome, MembershipGuard};
pub use service::{AccessIdentity, AuthService, RegisterInput, TokenPair};
pub use token::{TokenType, VerifiedToken};
