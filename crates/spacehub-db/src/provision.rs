//! Tenant namespace provisioning.
//!
//! Each organization's business data lives in its own SurrealDB
//! database (named by its [`NamespaceName`]) inside the shared
//! namespace. Every statement here is `IF NOT EXISTS`, so provisioning
//! an existing namespace re-verifies it without changing anything.

use std::collections::BTreeSet;

use spacehub_core::error::{HubError, HubResult};
use spacehub_core::namespace::NamespaceName;
use spacehub_core::repository::NamespaceProvisioner;
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use tracing::{info, warn};

use crate::connection::DbPool;
use crate::error::DbError;

/// Tables every tenant namespace must contain.
pub const TENANT_TABLES: &[&str] = &["space", "reservation"];

const TENANT_SCHEMA: &str = "\
-- =======================================================================
-- Spaces
-- =======================================================================
DEFINE TABLE IF NOT EXISTS space SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS name ON TABLE space TYPE string;
DEFINE FIELD IF NOT EXISTS description ON TABLE space TYPE option<string>;
DEFINE FIELD IF NOT EXISTS space_type ON TABLE space TYPE string \
    ASSERT $value IN ['hourly', 'daily', 'monthly'];
DEFINE FIELD IF NOT EXISTS capacity ON TABLE space TYPE option<int>;
DEFINE FIELD IF NOT EXISTS price_per_unit ON TABLE space TYPE float;
DEFINE FIELD IF NOT EXISTS is_available ON TABLE space TYPE bool \
    DEFAULT true;
DEFINE FIELD IF NOT EXISTS floor ON TABLE space TYPE option<string>;
DEFINE FIELD IF NOT EXISTS area_sqm ON TABLE space TYPE option<float>;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE space TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON TABLE space TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_space_name ON TABLE space COLUMNS name;
DEFINE INDEX IF NOT EXISTS idx_space_type ON TABLE space \
    COLUMNS space_type;

-- =======================================================================
-- Reservations (space is a record link into this namespace only)
-- =======================================================================
DEFINE TABLE IF NOT EXISTS reservation SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS user_id ON TABLE reservation TYPE string;
DEFINE FIELD IF NOT EXISTS space ON TABLE reservation TYPE record<space>;
DEFINE FIELD IF NOT EXISTS start_time ON TABLE reservation TYPE datetime;
DEFINE FIELD IF NOT EXISTS end_time ON TABLE reservation TYPE datetime;
DEFINE FIELD IF NOT EXISTS total_price ON TABLE reservation TYPE float;
DEFINE FIELD IF NOT EXISTS status ON TABLE reservation TYPE string \
    DEFAULT 'pending' \
    ASSERT $value IN ['pending', 'confirmed', 'cancelled', 'completed'];
DEFINE FIELD IF NOT EXISTS notes ON TABLE reservation TYPE option<string>;
DEFINE FIELD IF NOT EXISTS created_at ON TABLE reservation TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON TABLE reservation TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_reservation_user ON TABLE reservation \
    COLUMNS user_id;
DEFINE INDEX IF NOT EXISTS idx_reservation_space ON TABLE reservation \
    COLUMNS space;
DEFINE INDEX IF NOT EXISTS idx_reservation_start ON TABLE reservation \
    COLUMNS start_time;
DEFINE INDEX IF NOT EXISTS idx_reservation_end ON TABLE reservation \
    COLUMNS end_time;
DEFINE INDEX IF NOT EXISTS idx_reservation_status ON TABLE reservation \
    COLUMNS status;
";

/// Tables and indexes currently present in a tenant namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceLayout {
    pub tables: BTreeSet<String>,
    pub indexes: BTreeSet<String>,
}

impl NamespaceLayout {
    pub fn is_complete(&self) -> bool {
        TENANT_TABLES.iter().all(|t| self.tables.contains(*t))
    }
}

#[derive(Debug, SurrealValue)]
struct NamespaceRow {
    namespace: String,
}

/// Provisions tenant namespaces on a [`DbPool`].
#[derive(Clone)]
pub struct SurrealNamespaceProvisioner<C: Connection> {
    pool: DbPool<C>,
}

impl<C: Connection> SurrealNamespaceProvisioner<C> {
    pub fn new(pool: DbPool<C>) -> Self {
        Self { pool }
    }

    /// Report the tables and indexes present in `namespace`.
    pub async fn describe(&self, namespace: &NamespaceName) -> HubResult<NamespaceLayout> {
        let conn = self.pool.tenant(namespace).await?;

        let mut result = conn
            .query("RETURN object::keys((INFO FOR DB).tables)")
            .await
            .map_err(DbError::from)?;
        let tables: Vec<String> = result.take(0).map_err(DbError::from)?;

        let mut layout = NamespaceLayout {
            tables: tables.into_iter().collect(),
            indexes: BTreeSet::new(),
        };

        for table in TENANT_TABLES {
            if !layout.tables.contains(*table) {
                continue;
            }
            let sql = format!("RETURN object::keys((INFO FOR TABLE {table}).indexes)");
            let mut result = conn.query(&sql).await
                .map_err(DbError::from)?;
            let indexes: Vec<String> = result.take(0).map_err(DbError::from)?;
            layout.indexes.extend(indexes);
        }

        Ok(layout)
    }

    /// Re-provision the namespace of every organization.
    ///
    /// Returns the namespaces that were verified. A stored namespace
    /// name that fails validation is skipped and logged, never
    /// interpolated.
    pub async fn repair_all(&self) -> HubResult<Vec<NamespaceName>> {
        let rows: Vec<NamespaceRow> = {
            let conn = self.pool.identity().await?;
            let mut result = conn
                .query("SELECT namespace FROM organization ORDER BY created_at ASC")
                .await
                .map_err(DbError::from)?;
            result.take(0).map_err(DbError::from)?
        };

        let mut repaired = Vec::with_capacity(rows.len());
        for row in rows {
            match NamespaceName::parse(&row.namespace) {
                Ok(namespace) => {
                    self.provision(&namespace).await?;
                    repaired.push(namespace);
                }
                Err(e) => warn!(namespace = %row.namespace, error = %e, "Skipping namespace"),
            }
        }

        info!(count = repaired.len(), "Tenant namespaces verified");
        Ok(repaired)
    }
}

impl<C: Connection> NamespaceProvisioner for SurrealNamespaceProvisioner<C> {
    async fn provision(&self, namespace: &NamespaceName) -> HubResult<()> {
        {
            let conn = self.pool.identity().await?;
            let sql = format!("DEFINE DATABASE IF NOT EXISTS {namespace}");
            conn.query(&sql)
                .await
                .map_err(DbError::from)?
                .check()
                .map_err(|e| HubError::Provisioning(format!("{namespace}: {e}")))?;
        }

        let conn = self.pool.tenant(namespace).await?;
        conn.query(TENANT_SCHEMA)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| HubError::Provisioning(format!("{namespace}: {e}")))?;

        info!(namespace = %namespace, "Tenant namespace provisioned");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tenant_table_is_defined() {
        for table in TENANT_TABLES {
            assert!(
                TENANT_SCHEMA.contains(&format!("DEFINE TABLE IF NOT EXISTS {table} ")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn tenant_schema_is_rerunnable() {
        for line in TENANT_SCHEMA.lines() {
            if line.starts_with("DEFINE ") {
                assert!(line.contains("IF NOT EXISTS"), "not idempotent: {line}");
            }
        }
    }
}
