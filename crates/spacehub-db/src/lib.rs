//! SpaceHub Database: SurrealDB connection pooling, identity schema,
//! tenant namespace provisioning and repository implementations.
//!
//! This crate provides:
//! - Connection pooling with per-checkout binding ([`DbPool`], [`DbConfig`])
//! - Identity schema migrations ([`run_migrations`], [`migrate`])
//! - Tenant namespace provisioning ([`SurrealNamespaceProvisioner`])
//! - Repository implementations for the `spacehub-core` traits
//! - Error types ([`DbError`])

mod connection;
mod error;
mod provision;
pub mod repository;
mod schema;

pub use connection::{Binding, DbConfig, DbPool, PooledConnection};
pub use error::DbError;
pub use provision::{NamespaceLayout, SurrealNamespaceProvisioner, TENANT_TABLES};
pub use schema::{migrate, run_migrations};
