//! Repository trait definitions for data access abstraction.
//!
//! Identity repositories operate on the shared identity database.
//! Tenant-scoped repositories take the caller's [`NamespaceName`] on
//! every call and must only touch that namespace.

use uuid::Uuid;

use crate::error::HubResult;
use crate::models::{
    membership::{CreateMembership, Membership, MembershipWithOrganization},
    organization::{CreateOrganization, Organization},
    refresh_token::{CreateRefreshToken, RefreshToken},
    space::{CreateSpace, Space},
    user::{CreateUser, User},
};
use crate::namespace::{NamespaceName, OrgSlug};

// ---------------------------------------------------------------------------
// Identity (shared database)
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    /// Fails with `DuplicateEmail` if the email is taken.
    fn create(&self, input: CreateUser) -> impl Future<Output = HubResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = HubResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = HubResult<User>> + Send;
    fn set_active(&self, id: Uuid, active: bool)
    -> impl Future<Output = HubResult<User>> + Send;
}

/// Who becomes the OWNER of a newly created organization.
#[derive(Debug, Clone)]
pub enum OrganizationOwner {
    Existing(Uuid),
    /// Created in the same transaction as the organization.
    New(CreateUser),
}

/// Result of creating an organization together with its owner.
#[derive(Debug, Clone)]
pub struct CreatedOrganization {
    pub organization: Organization,
    pub owner: User,
    pub membership: Membership,
}

pub trait OrganizationRepository: Send + Sync {
    /// Atomically create the organization, its OWNER membership and,
    /// for [`OrganizationOwner::New`], the owning user.
    ///
    /// Fails with `DuplicateSlug` or `DuplicateEmail`; nothing is
    /// written on failure.
    fn create_with_owner(
        &self,
        input: CreateOrganization,
        owner: OrganizationOwner,
    ) -> impl Future<Output = HubResult<CreatedOrganization>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = HubResult<Organization>> + Send;
    fn get_by_slug(&self, slug: &OrgSlug) -> impl Future<Output = HubResult<Organization>> + Send;
    fn list(&self) -> impl Future<Output = HubResult<Vec<Organization>>> + Send;
}

pub trait MembershipRepository: Send + Sync {
    /// Fails with `AlreadyMember` if the (user, organization) pair exists.
    fn create(&self, input: CreateMembership)
    -> impl Future<Output = HubResult<Membership>> + Send;
    fn get(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> impl Future<Output = HubResult<Option<Membership>>> + Send;
    /// The user's oldest ACTIVE membership, if any.
    fn first_active_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = HubResult<Option<Membership>>> + Send;
    fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = HubResult<Vec<MembershipWithOrganization>>> + Send;
}

pub trait RefreshTokenRepository: Send + Sync {
    fn create(
        &self,
        input: CreateRefreshToken,
    ) -> impl Future<Output = HubResult<RefreshToken>> + Send;
    fn get_by_hash(&self, token_hash: &str) -> impl Future<Output = HubResult<RefreshToken>> + Send;
    /// In one transaction: revoke the usable record `old_hash` and
    /// persist `replacement`.
    ///
    /// Fails with `RevokedToken` when the old record is no longer
    /// usable at commit time; in that case nothing is written.
    fn rotate(
        &self,
        old_hash: &str,
        replacement: CreateRefreshToken,
    ) -> impl Future<Output = HubResult<RefreshToken>> + Send;
    /// Returns `true` if this call revoked the token, `false` if it was
    /// already revoked or unknown.
    fn revoke(&self, token_hash: &str) -> impl Future<Output = HubResult<bool>> + Send;
    fn revoke_all_for_user(&self, user_id: Uuid) -> impl Future<Output = HubResult<u64>> + Send;
    fn purge_expired(&self) -> impl Future<Output = HubResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant namespaces
// ---------------------------------------------------------------------------

pub trait NamespaceProvisioner: Send + Sync {
    /// Idempotently create the namespace and its tables and indexes.
    fn provision(&self, namespace: &NamespaceName) -> impl Future<Output = HubResult<()>> + Send;
}

pub trait SpaceRepository: Send + Sync {
    fn create(
        &self,
        namespace: &NamespaceName,
        input: CreateSpace,
    ) -> impl Future<Output = HubResult<Space>> + Send;
    fn get_by_id(
        &self,
        namespace: &NamespaceName,
        id: Uuid,
    ) -> impl Future<Output = HubResult<Space>> + Send;
    fn list(&self, namespace: &NamespaceName) -> impl Future<Output = HubResult<Vec<Space>>> + Send;
}
