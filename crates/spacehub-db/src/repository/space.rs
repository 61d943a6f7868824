//! SurrealDB implementation of [`SpaceRepository`].
//!
//! Every call checks out a connection bound to the caller's tenant
//! namespace; no query here names a namespace itself.

use chrono::{DateTime, Utc};
use spacehub_core::error::{HubError, HubResult};
use spacehub_core::models::space::{CreateSpace, Space};
use spacehub_core::namespace::NamespaceName;
use spacehub_core::repository::SpaceRepository;
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::connection::DbPool;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SpaceRowWithId {
    record_id: String,
    name: String,
    description: Option<String>,
    space_type: String,
    capacity: Option<u32>,
    price_per_unit: f64,
    is_available: bool,
    floor: Option<String>,
    area_sqm: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SpaceRowWithId {
    fn try_into_space(self) -> Result<Space, DbError> {
        Ok(Space {
            id: parse_uuid(&self.record_id, "space")?,
            name: self.name,
            description: self.description,
            space_type: self
                .space_type
                .parse()
                .map_err(|e: HubError| DbError::Corrupt(e.to_string()))?,
            capacity: self.capacity,
            price_per_unit: self.price_per_unit,
            is_available: self.is_available,
            floor: self.floor,
            area_sqm: self.area_sqm,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Space repository.
#[derive(Clone)]
pub struct SurrealSpaceRepository<C: Connection> {
    pool: DbPool<C>,
}

impl<C: Connection> SurrealSpaceRepository<C> {
    pub fn new(pool: DbPool<C>) -> Self {
        Self { pool }
    }
}

impl<C: Connection> SpaceRepository for SurrealSpaceRepository<C> {
    async fn create(&self, namespace: &NamespaceName, input: CreateSpace) -> HubResult<Space> {
        if input.name.trim().is_empty() {
            return Err(HubError::Validation {
                message: "space name must not be empty".into(),
            });
        }
        if !(input.price_per_unit.is_finite() && input.price_per_unit >= 0.0) {
            return Err(HubError::Validation {
                message: "price_per_unit must be a non-negative number".into(),
            });
        }

        let id = Uuid::new_v4().to_string();

        let conn = self.pool.tenant(namespace).await?;
        let result = conn
            .query(
                "CREATE type::record('space', $id) SET \
                 name = $name, \
                 description = $description, \
                 space_type = $space_type, \
                 capacity = $capacity, \
                 price_per_unit = $price_per_unit, \
                 is_available = $is_available, \
                 floor = $floor, \
                 area_sqm = $area_sqm; \
                 SELECT meta::id(id) AS record_id, * FROM type::record('space', $id);",
            )
            .bind(("id", id.clone()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("space_type", input.space_type.as_str().to_string()))
            .bind(("capacity", input.capacity))
            .bind(("price_per_unit", input.price_per_unit))
            .bind(("is_available", input.is_available))
            .bind(("floor", input.floor))
            .bind(("area_sqm", input.area_sqm))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SpaceRowWithId> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| HubError::not_found("space", &id))?;

        Ok(row.try_into_space()?)
    }

    async fn get_by_id(&self, namespace: &NamespaceName, id: Uuid) -> HubResult<Space> {
        let id_str = id.to_string();

        let conn = self.pool.tenant(namespace).await?;
        let mut result = conn
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('space', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpaceRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| HubError::not_found("space", &id_str))?;

        Ok(row.try_into_space()?)
    }

    async fn list(&self, namespace: &NamespaceName) -> HubResult<Vec<Space>> {
        let conn = self.pool.tenant(namespace).await?;
        let mut result = conn
            .query("SELECT meta::id(id) AS record_id, * FROM space ORDER BY name ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpaceRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_space().map_err(Into::into))
            .collect()
    }
}
