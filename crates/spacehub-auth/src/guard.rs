//! Membership guard: role checks and organization membership
//! management on behalf of an authenticated user.

use spacehub_core::error::{HubError, HubResult};
use spacehub_core::models::membership::{
    CreateMembership, MemberRole, Membership, MembershipStatus, MembershipWithOrganization,
};
use spacehub_core::models::organization::{CreateOrganization, Organization};
use spacehub_core::namespace::OrgSlug;
use spacehub_core::repository::{
    MembershipRepository, NamespaceProvisioner, OrganizationOwner, OrganizationRepository,
    UserRepository,
};
use tracing::info;
use uuid::Uuid;

use crate::service::normalize_email;

/// Result of inviting an email address into an organization.
#[derive(Debug, Clone)]
pub enum InviteOutcome {
    /// The address belonged to a user, who is now an ACTIVE member.
    Added(Membership),
    /// No user has this address; nothing was written.
    Deferred { email: String },
}

pub struct MembershipGuard<U, O, M, P>
where
    U: UserRepository,
    O: OrganizationRepository,
    M: MembershipRepository,
    P: NamespaceProvisioner,
{
    users: U,
    organizations: O,
    memberships: M,
    provisioner: P,
}

impl<U, O, M, P> MembershipGuard<U, O, M, P>
where
    U: UserRepository,
    O: OrganizationRepository,
    M: MembershipRepository,
    P: NamespaceProvisioner,
{
    pub fn new(users: U, organizations: O, memberships: M, provisioner: P) -> Self {
        Self {
            users,
            organizations,
            memberships,
            provisioner,
        }
    }

    /// Fails with `Forbidden` unless `user_id` holds an ACTIVE
    /// membership in `organization_id` with one of `allowed`.
    pub async fn require_role(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        allowed: &[MemberRole],
    ) -> HubResult<Membership> {
        match self.memberships.get(user_id, organization_id).await? {
            Some(m) if m.grants(allowed) => Ok(m),
            _ => Err(HubError::Forbidden {
                reason: "Insufficient permissions".into(),
            }),
        }
    }

    /// Add `user_id` to `organization_id` as an ACTIVE member.
    pub async fn add_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: MemberRole,
    ) -> HubResult<Membership> {
        if self.memberships.get(user_id, organization_id).await?.is_some() {
            return Err(HubError::AlreadyMember);
        }
        self.memberships
            .create(CreateMembership {
                user_id,
                organization_id,
                role,
                status: MembershipStatus::Active,
            })
            .await
    }

    /// Invite `email` into `organization_id`. The inviter must be an
    /// OWNER or ADMIN there.
    pub async fn invite(
        &self,
        organization_id: Uuid,
        inviter: Uuid,
        email: &str,
        role: MemberRole,
    ) -> HubResult<InviteOutcome> {
        self.require_role(inviter, organization_id, MemberRole::MANAGERS)
            .await?;

        let email = normalize_email(email)?;
        let invitee = match self.users.get_by_email(&email).await {
            Ok(user) => user,
            Err(HubError::NotFound { .. }) => {
                info!(organization_id = %organization_id, "Invitation deferred for unknown email");
                return Ok(InviteOutcome::Deferred { email });
            }
            Err(e) => return Err(e),
        };

        let membership = self.add_member(organization_id, invitee.id, role).await?;
        info!(
            organization_id = %organization_id,
            user_id = %invitee.id,
            role = %role,
            "Member added"
        );
        Ok(InviteOutcome::Added(membership))
    }

    /// Every membership of `user_id`, with its organization.
    pub async fn list_memberships(
        &self,
        user_id: Uuid,
    ) -> HubResult<Vec<MembershipWithOrganization>> {
        self.memberships.list_for_user(user_id).await
    }

    /// The organization named by `slug`, visible only to its members.
    ///
    /// Non-members get the same `NotFound` as a missing slug.
    pub async fn get_organization_for_member(
        &self,
        slug: &str,
        user_id: Uuid,
    ) -> HubResult<Organization> {
        let not_found = || HubError::not_found("organization", format!("slug={slug}"));
        let slug = OrgSlug::parse(slug).map_err(|_| not_found())?;
        let organization = self.organizations.get_by_slug(&slug).await?;
        match self.memberships.get(user_id, organization.id).await? {
            Some(_) => Ok(organization),
            None => Err(not_found()),
        }
    }

    /// Provision and create an additional organization owned by
    /// `owner_id`.
    pub async fn create_organization(
        &self,
        owner_id: Uuid,
        name: &str,
        slug: &str,
    ) -> HubResult<MembershipWithOrganization> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HubError::Validation {
                message: "organization name must not be empty".into(),
            });
        }
        let slug = OrgSlug::parse(slug)?;
        match self.organizations.get_by_slug(&slug).await {
            Ok(_) => return Err(HubError::DuplicateSlug),
            Err(HubError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let input = CreateOrganization::new(name, slug);
        self.provisioner.provision(&input.namespace).await?;

        let created = self
            .organizations
            .create_with_owner(input, OrganizationOwner::Existing(owner_id))
            .await?;

        info!(
            user_id = %owner_id,
            organization_id = %created.organization.id,
            namespace = %created.organization.namespace,
            "Organization created"
        );

        Ok(MembershipWithOrganization {
            organization: created.organization,
            role: created.membership.role,
            status: created.membership.status,
            created_at: created.membership.created_at,
        })
    }
}
