//! Membership domain model: the role/status binding between a user and
//! an organization.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HubError;
use crate::models::organization::Organization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "OWNER",
            Self::Admin => "ADMIN",
            Self::Member => "MEMBER",
        }
    }

    /// Roles allowed to manage an organization's members.
    pub const MANAGERS: &'static [MemberRole] = &[MemberRole::Owner, MemberRole::Admin];
}

impl FromStr for MemberRole {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER" => Ok(Self::Owner),
            "ADMIN" => Ok(Self::Admin),
            "MEMBER" => Ok(Self::Member),
            other => Err(HubError::Validation {
                message: format!("unknown member role: {other}"),
            }),
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MembershipStatus {
    Active,
    Invited,
}

impl MembershipStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Invited => "INVITED",
        }
    }
}

impl FromStr for MembershipStatus {
    type Err = HubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "INVITED" => Ok(Self::Invited),
            other => Err(HubError::Validation {
                message: format!("unknown membership status: {other}"),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: MemberRole,
    pub status: MembershipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// Whether this membership grants one of `allowed`.
    pub fn grants(&self, allowed: &[MemberRole]) -> bool {
        match self.status {
            MembershipStatus::Active => allowed.contains(&self.role),
            MembershipStatus::Invited => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub user_id: Uuid,
    pub organization_id: Uuid,
    pub role: MemberRole,
    pub status: MembershipStatus,
}

/// A membership joined with its organization, as listed for a user.
#[derive(Debug, Clone, Serialize)]
pub struct MembershipWithOrganization {
    pub organization: Organization,
    pub role: MemberRole,
    pub status: MembershipStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(role: MemberRole, status: MembershipStatus) -> Membership {
        Membership {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            role,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_string_roundtrip() {
        for role in [MemberRole::Owner, MemberRole::Admin, MemberRole::Member] {
            assert_eq!(role.as_str().parse::<MemberRole>().unwrap(), role);
        }
        assert!("owner".parse::<MemberRole>().is_err());
    }

    #[test]
    fn active_manager_is_granted() {
        let m = membership(MemberRole::Admin, MembershipStatus::Active);
        assert!(m.grants(MemberRole::MANAGERS));
    }

    #[test]
    fn plain_member_is_not_a_manager() {
        let m = membership(MemberRole::Member, MembershipStatus::Active);
        assert!(!m.grants(MemberRole::MANAGERS));
    }

    #[test]
    fn invited_owner_is_not_granted() {
        let m = membership(MemberRole::Owner, MembershipStatus::Invited);
        assert!(!m.grants(MemberRole::MANAGERS));
    }
}
