//! SurrealDB connection pool with per-checkout namespace binding.
//!
//! A SurrealDB handle carries session state (the selected namespace
//! and database). Every checkout selects its target unconditionally
//! before the handle is handed out, so the binding made for one
//! request can never be observed by the next request that reuses the
//! same connection.

use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;
use spacehub_core::namespace::NamespaceName;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, info};

use crate::error::DbError;

/// Configuration for connecting to SurrealDB.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Endpoint, e.g. `ws://127.0.0.1:8000` or `mem://`.
    pub url: String,
    /// SurrealDB namespace holding the identity and tenant databases.
    pub namespace: String,
    /// Database holding users, organizations, memberships and tokens.
    pub identity_database: String,
    /// Root credentials. Skipped for embedded (`mem://`) endpoints.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Number of connections to open. Forced to 1 for `mem://`.
    pub pool_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "mem://".into(),
            namespace: "spacehub".into(),
            identity_database: "identity".into(),
            username: None,
            password: None,
            pool_size: 8,
        }
    }
}

impl DbConfig {
    fn is_embedded(&self) -> bool {
        self.url.starts_with("mem://")
    }
}

/// What a checked-out connection currently addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Identity,
    Tenant(NamespaceName),
}

struct PoolInner<C: Connection> {
    idle: Mutex<Vec<Surreal<C>>>,
    permits: Arc<Semaphore>,
    namespace: String,
    identity_database: String,
}

/// Fixed-size pool of SurrealDB connections.
pub struct DbPool<C: Connection> {
    inner: Arc<PoolInner<C>>,
}

impl<C: Connection> Clone for DbPool<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connection> DbPool<C> {
    /// Build a pool over already-connected handles. Each handle must be
    /// an independent connection.
    pub fn from_handles(
        handles: Vec<Surreal<C>>,
        namespace: impl Into<String>,
        identity_database: impl Into<String>,
    ) -> Self {
        let size = handles.len();
        Self {
            inner: Arc::new(PoolInner {
                idle: Mutex::new(handles),
                permits: Arc::new(Semaphore::new(size)),
                namespace: namespace.into(),
                identity_database: identity_database.into(),
            }),
        }
    }

    /// Pool over a single connection (embedded engines, tests).
    pub fn single(
        db: Surreal<C>,
        namespace: impl Into<String>,
        identity_database: impl Into<String>,
    ) -> Self {
        Self::from_handles(vec![db], namespace, identity_database)
    }

    pub fn namespace(&self) -> &str {
        &self.inner.namespace
    }

    pub fn identity_database(&self) -> &str {
        &self.inner.identity_database
    }

    /// Check out a connection addressing the shared identity database.
    pub async fn identity(&self) -> Result<PooledConnection<C>, DbError> {
        let database = self.inner.identity_database.clone();
        self.checkout(Binding::Identity, &database).await
    }

    /// Check out a connection addressing a tenant's namespace.
    pub async fn tenant(&self, namespace: &NamespaceName) -> Result<PooledConnection<C>, DbError> {
        self.checkout(Binding::Tenant(namespace.clone()), namespace.as_str())
            .await
    }

    async fn checkout(
        &self,
        binding: Binding,
        database: &str,
    ) -> Result<PooledConnection<C>, DbError> {
        let permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|_| DbError::PoolClosed)?;

        let db = self.inner.idle.lock().pop().ok_or(DbError::PoolClosed)?;

        // Guard first: if binding fails the handle still goes back.
        let conn = PooledConnection {
            db,
            pool: Arc::clone(&self.inner),
            binding,
            _permit: permit,
        };

        conn.use_ns(&self.inner.namespace).use_db(database).await?;
        debug!(binding = ?conn.binding, "Checked out connection");

        Ok(conn)
    }
}

impl DbPool<Any> {
    /// Open `config.pool_size` connections (one for embedded endpoints),
    /// authenticate and select the identity database on each.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        let size = if config.is_embedded() {
            1
        } else {
            config.pool_size.max(1)
        };

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.identity_database,
            size,
            "Connecting to SurrealDB"
        );

        let mut handles = Vec::with_capacity(size);
        for _ in 0..size {
            let db = any::connect(config.url.as_str()).await?;

            if let (Some(username), Some(password)) = (&config.username, &config.password) {
                db.signin(Root {
                    username: username.clone(),
                    password: password.clone(),
                })
                .await?;
            }

            db.use_ns(&config.namespace)
                .use_db(&config.identity_database)
                .await?;
            handles.push(db);
        }

        info!("Successfully connected to SurrealDB");

        Ok(Self::from_handles(
            handles,
            config.namespace.clone(),
            config.identity_database.clone(),
        ))
    }
}

/// A connection checked out of a [`DbPool`]; returns to the pool on drop.
///
/// Callers submit multi-statement work as a single query so that a
/// connection is never returned in the middle of a transaction.
pub struct PooledConnection<C: Connection> {
    db: Surreal<C>,
    pool: Arc<PoolInner<C>>,
    binding: Binding,
    _permit: OwnedSemaphorePermit,
}

impl<C: Connection> PooledConnection<C> {
    pub fn binding(&self) -> &Binding {
        &self.binding
    }
}

impl<C: Connection> Deref for PooledConnection<C> {
    type Target = Surreal<C>;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

impl<C: Connection> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        // The permit is released after this runs, so the handle is
        // back in `idle` before another checkout can proceed.
        self.pool.idle.lock().push(self.db.clone());
    }
}
