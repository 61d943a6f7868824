//! SurrealDB implementation of [`OrganizationRepository`].
//!
//! Creating an organization writes the organization, its OWNER
//! membership and (optionally) the owning user in a single
//! transaction. Record IDs are generated client-side so the rows can
//! be read back after commit.

use chrono::{DateTime, Utc};
use spacehub_core::error::{HubError, HubResult};
use spacehub_core::models::membership::{MemberRole, MembershipStatus};
use spacehub_core::models::organization::{CreateOrganization, Organization};
use spacehub_core::namespace::{NamespaceName, OrgSlug};
use spacehub_core::repository::{CreatedOrganization, OrganizationOwner, OrganizationRepository};
use surrealdb::Connection;
use surrealdb_types::SurrealValue;
use tracing::warn;
use uuid::Uuid;

use super::membership::MembershipRowWithId;
use super::user::UserRowWithId;
use super::{CountRow, parse_uuid};
use crate::connection::DbPool;
use crate::error::{DbError, classify_write_error};

const CREATE_OWNER: &str = "\
CREATE type::record('user', $owner_id) SET \
    email = $owner_email, \
    password_hash = $owner_password_hash, \
    full_name = $owner_full_name, \
    is_active = true, \
    is_superuser = $owner_is_superuser;
";

const CREATE_ORGANIZATION: &str = "\
CREATE type::record('organization', $org_id) SET \
    name = $name, \
    slug = $slug, \
    namespace = $namespace, \
    is_active = true, \
    email = $email, \
    phone = $phone;
CREATE type::record('membership', $membership_id) SET \
    user_id = $owner_id, \
    organization_id = $org_id, \
    role = $role, \
    status = $status;
";

const READ_BACK: &str = "\
SELECT meta::id(id) AS record_id, * FROM type::record('organization', $org_id);
SELECT meta::id(id) AS record_id, * FROM type::record('user', $owner_id);
SELECT meta::id(id) AS record_id, * FROM type::record('membership', $membership_id);
";

#[derive(Debug, SurrealValue)]
pub(crate) struct OrganizationRowWithId {
    record_id: String,
    name: String,
    slug: String,
    namespace: String,
    is_active: bool,
    email: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRowWithId {
    pub(crate) fn try_into_organization(self) -> Result<Organization, DbError> {
        let slug = OrgSlug::parse(&self.slug).map_err(|e| DbError::Corrupt(e.to_string()))?;
        let namespace =
            NamespaceName::parse(&self.namespace).map_err(|e| DbError::Corrupt(e.to_string()))?;
        Ok(Organization {
            id: parse_uuid(&self.record_id, "organization")?,
            name: self.name,
            slug,
            namespace,
            is_active: self.is_active,
            email: self.email,
            phone: self.phone,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Organization repository.
#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    pool: DbPool<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(pool: DbPool<C>) -> Self {
        Self { pool }
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create_with_owner(
        &self,
        input: CreateOrganization,
        owner: OrganizationOwner,
    ) -> HubResult<CreatedOrganization> {
        let org_id = Uuid::new_v4().to_string();
        let membership_id = Uuid::new_v4().to_string();
        let (owner_id, new_owner) = match owner {
            OrganizationOwner::Existing(id) => (id.to_string(), None),
            OrganizationOwner::New(user) => (Uuid::new_v4().to_string(), Some(user)),
        };
        let owner_email = new_owner.as_ref().map(|u| u.email.clone());
        let slug = input.slug.as_str().to_string();

        let conn = self.pool.identity().await?;

        if new_owner.is_none() {
            let mut result = conn
                .query("SELECT count() AS total FROM type::record('user', $id) GROUP ALL")
                .bind(("id", owner_id.clone()))
                .await
                .map_err(DbError::from)?;
            let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
            if rows.first().map(|r| r.total).unwrap_or(0) == 0 {
                return Err(HubError::not_found("user", &owner_id));
            }
        }

        let mut sql = String::from("BEGIN TRANSACTION;\n");
        if new_owner.is_some() {
            sql.push_str(CREATE_OWNER);
        }
        sql.push_str(CREATE_ORGANIZATION);
        sql.push_str("COMMIT TRANSACTION;");

        let mut query = conn
            .query(&sql)
            .bind(("org_id", org_id.clone()))
            .bind(("membership_id", membership_id.clone()))
            .bind(("owner_id", owner_id.clone()))
            .bind(("name", input.name))
            .bind(("slug", slug.clone()))
            .bind(("namespace", input.namespace.as_str().to_string()))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("role", MemberRole::Owner.as_str().to_string()))
            .bind(("status", MembershipStatus::Active.as_str().to_string()));

        if let Some(user) = new_owner {
            query = query
                .bind(("owner_email", user.email))
                .bind(("owner_password_hash", user.password_hash))
                .bind(("owner_full_name", user.full_name))
                .bind(("owner_is_superuser", user.is_superuser));
        }

        let outcome = query.await.map_err(DbError::from)?.check();
        if let Err(e) = outcome {
            let err = classify_write_error(e.to_string());
            if !matches!(err, HubError::Database(_)) {
                return Err(err);
            }
            // A failed transaction may surface a generic "not executed"
            // error ahead of the constraint violation.
            let mut result = conn
                .query(
                    "SELECT count() AS total FROM user WHERE email = $email GROUP ALL; \
                     SELECT count() AS total FROM organization WHERE slug = $slug GROUP ALL;",
                )
                .bind(("email", owner_email.unwrap_or_default()))
                .bind(("slug", slug))
                .await
                .map_err(DbError::from)?;
            let emails: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
            let slugs: Vec<CountRow> = result.take(1).map_err(DbError::from)?;
            if emails.first().is_some_and(|r| r.total > 0) {
                return Err(HubError::DuplicateEmail);
            }
            if slugs.first().is_some_and(|r| r.total > 0) {
                return Err(HubError::DuplicateSlug);
            }
            warn!(error = %err, "Organization transaction failed");
            return Err(err);
        }

        let mut result = conn
            .query(READ_BACK)
            .bind(("org_id", org_id.clone()))
            .bind(("owner_id", owner_id.clone()))
            .bind(("membership_id", membership_id.clone()))
            .await
            .map_err(DbError::from)?;

        let organizations: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        let owners: Vec<UserRowWithId> = result.take(1).map_err(DbError::from)?;
        let memberships: Vec<MembershipRowWithId> = result.take(2).map_err(DbError::from)?;

        let organization = organizations
            .into_iter()
            .next()
            .ok_or_else(|| HubError::not_found("organization", &org_id))?
            .try_into_organization()?;
        let owner = owners
            .into_iter()
            .next()
            .ok_or_else(|| HubError::not_found("user", &owner_id))?
            .try_into_user()?;
        let membership = memberships
            .into_iter()
            .next()
            .ok_or_else(|| HubError::not_found("membership", &membership_id))?
            .try_into_membership()?;

        Ok(CreatedOrganization {
            organization,
            owner,
            membership,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> HubResult<Organization> {
        let id_str = id.to_string();

        let conn = self.pool.identity().await?;
        let mut result = conn
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('organization', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| HubError::not_found("organization", &id_str))?;

        Ok(row.try_into_organization()?)
    }

    async fn get_by_slug(&self, slug: &OrgSlug) -> HubResult<Organization> {
        let slug = slug.as_str().to_string();

        let conn = self.pool.identity().await?;
        let mut result = conn
            .query("SELECT meta::id(id) AS record_id, * FROM organization WHERE slug = $slug")
            .bind(("slug", slug.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| HubError::not_found("organization", format!("slug={slug}")))?;

        Ok(row.try_into_organization()?)
    }

    async fn list(&self) -> HubResult<Vec<Organization>> {
        let conn = self.pool.identity().await?;
        let mut result = conn
            .query("SELECT meta::id(id) AS record_id, * FROM organization ORDER BY created_at ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|row| row.try_into_organization().map_err(Into::into))
            .collect()
    }
}
