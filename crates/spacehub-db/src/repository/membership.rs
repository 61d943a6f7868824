//! SurrealDB implementation of [`MembershipRepository`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use spacehub_core::error::{HubError, HubResult};
use spacehub_core::models::membership::{
    CreateMembership, Membership, MembershipWithOrganization,
};
use spacehub_core::repository::MembershipRepository;
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::organization::OrganizationRowWithId;
use super::parse_uuid;
use crate::connection::DbPool;
use crate::error::{DbError, classify_write_error};

#[derive(Debug, SurrealValue)]
pub(crate) struct MembershipRowWithId {
    record_id: String,
    user_id: String,
    organization_id: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRowWithId {
    pub(crate) fn try_into_membership(self) -> Result<Membership, DbError> {
        Ok(Membership {
            id: parse_uuid(&self.record_id, "membership")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            organization_id: parse_uuid(&self.organization_id, "organization")?,
            role: self
                .role
                .parse()
                .map_err(|e: HubError| DbError::Corrupt(e.to_string()))?,
            status: self
                .status
                .parse()
                .map_err(|e: HubError| DbError::Corrupt(e.to_string()))?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Membership repository.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    pool: DbPool<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(pool: DbPool<C>) -> Self {
        Self { pool }
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn create(&self, input: CreateMembership) -> HubResult<Membership> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let conn = self.pool.identity().await?;
        let result = conn
            .query(
                "CREATE type::record('membership', $id) SET \
                 user_id = $user_id, \
                 organization_id = $organization_id, \
                 role = $role, \
                 status = $status; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('membership', $id);",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("organization_id", input.organization_id.to_string()))
            .bind(("role", input.role.as_str().to_string()))
            .bind(("status", input.status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| classify_write_error(e.to_string()))?;

        let rows: Vec<MembershipRowWithId> = result.take(1).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| HubError::not_found("membership", &id_str))?;

        Ok(row.try_into_membership()?)
    }

    async fn get(&self, user_id: Uuid, organization_id: Uuid) -> HubResult<Option<Membership>> {
        let conn = self.pool.identity().await?;
        let mut result = conn
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE user_id = $user_id AND organization_id = $organization_id",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_membership().map_err(Into::into))
            .transpose()
    }

    async fn first_active_for_user(&self, user_id: Uuid) -> HubResult<Option<Membership>> {
        let conn = self.pool.identity().await?;
        let mut result = conn
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE user_id = $user_id AND status = 'ACTIVE' \
                 ORDER BY created_at ASC LIMIT 1",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_membership().map_err(Into::into))
            .transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> HubResult<Vec<MembershipWithOrganization>> {
        let conn = self.pool.identity().await?;
        let mut result = conn
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE user_id = $user_id ORDER BY created_at ASC; \
                 SELECT meta::id(id) AS record_id, * FROM organization \
                 WHERE meta::id(id) IN \
                 (SELECT VALUE organization_id FROM membership WHERE user_id = $user_id);",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let memberships: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        let organizations: Vec<OrganizationRowWithId> = result.take(1).map_err(DbError::from)?;

        let mut by_id = HashMap::with_capacity(organizations.len());
        for row in organizations {
            let organization = row.try_into_organization()?;
            by_id.insert(organization.id, organization);
        }

        let mut listed = Vec::with_capacity(memberships.len());
        for row in memberships {
            let membership = row.try_into_membership()?;
            let organization = by_id
                .get(&membership.organization_id)
                .cloned()
                .ok_or_else(|| HubError::not_found("organization", membership.organization_id))?;
            listed.push(MembershipWithOrganization {
                organization,
                role: membership.role,
                status: membership.status,
                created_at: membership.created_at,
            });
        }

        Ok(listed)
    }
}
