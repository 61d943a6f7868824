//! Domain models for SpaceHub.
//!
//! Identity records (users, organizations, memberships, refresh tokens)
//! live in the shared identity database; spaces live inside a tenant's
//! own namespace.

pub mod membership;
pub mod organization;
pub mod refresh_token;
pub mod space;
pub mod user;
