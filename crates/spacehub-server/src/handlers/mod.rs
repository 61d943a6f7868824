//! HTTP request handlers.

pub mod auth;
pub mod health;
pub mod orgs;
pub mod spaces;
