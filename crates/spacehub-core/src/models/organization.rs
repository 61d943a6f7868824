//! Organization (tenant) domain model.
//!
//! Every organization owns exactly one isolated namespace whose name
//! is derived from the slug at creation time and never changes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::namespace::{NamespaceName, OrgSlug};

#[derive(Debug, Clone, Serialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: OrgSlug,
    #[serde(skip_serializing)]
    pub namespace: NamespaceName,
    pub is_active: bool,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new organization.
#[derive(Debug, Clone)]
pub struct CreateOrganization {
    pub name: String,
    pub slug: OrgSlug,
    pub namespace: NamespaceName,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CreateOrganization {
    /// Build the creation input, deriving the namespace from the slug.
    pub fn new(name: impl Into<String>, slug: OrgSlug) -> Self {
        let namespace = NamespaceName::for_slug(&slug);
        Self {
            name: name.into(),
            slug,
            namespace,
            email: None,
            phone: None,
        }
    }
}
