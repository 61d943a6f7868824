//! Authentication service: registration, login, refresh rotation and
//! logout orchestration.

use chrono::Utc;
use serde::Serialize;
use spacehub_core::error::{HubError, HubResult};
use spacehub_core::models::membership::{MemberRole, Membership};
use spacehub_core::models::organization::CreateOrganization;
use spacehub_core::models::user::{CreateUser, User};
use spacehub_core::namespace::OrgSlug;
use spacehub_core::repository::{
    MembershipRepository, NamespaceProvisioner, OrganizationOwner, OrganizationRepository,
    RefreshTokenRepository, UserRepository,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, TokenType, VerifiedToken};

/// Input for the self-service registration flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    pub organization_name: String,
    pub organization_slug: String,
}

/// Access/refresh token pair returned by register, login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Identity proven by a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessIdentity {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U, O, M, R, P>
where
    U: UserRepository,
    O: OrganizationRepository,
    M: MembershipRepository,
    R: RefreshTokenRepository,
    P: NamespaceProvisioner,
{
    users: U,
    organizations: O,
    memberships: M,
    refresh_tokens: R,
    provisioner: P,
    config: AuthConfig,
}

impl<U, O, M, R, P> AuthService<U, O, M, R, P>
where
    U: UserRepository,
    O: OrganizationRepository,
    M: MembershipRepository,
    R: RefreshTokenRepository,
    P: NamespaceProvisioner,
{
    pub fn new(
        users: U,
        organizations: O,
        memberships: M,
        refresh_tokens: R,
        provisioner: P,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            organizations,
            memberships,
            refresh_tokens,
            provisioner,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create a user, an organization with its namespace, and the
    /// OWNER membership binding them; then issue a token pair.
    ///
    /// The namespace is provisioned before any identity row is
    /// written, so a provisioning failure leaves the identity store
    /// untouched.
    pub async fn register(&self, input: RegisterInput) -> HubResult<TokenPair> {
        let email = normalize_email(&input.email)?;
        if input.password.chars().count() < self.config.min_password_length {
            return Err(AuthError::WeakPassword {
                min: self.config.min_password_length,
            }
            .into());
        }
        let name = input.organization_name.trim();
        if name.is_empty() {
            return Err(HubError::Validation {
                message: "organization name must not be empty".into(),
            });
        }
        let slug = OrgSlug::parse(&input.organization_slug)?;

        match self.users.get_by_email(&email).await {
            Ok(_) => return Err(HubError::DuplicateEmail),
            Err(HubError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }
        match self.organizations.get_by_slug(&slug).await {
            Ok(_) => return Err(HubError::DuplicateSlug),
            Err(HubError::NotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let password_hash = password::hash_password(&input.password, self.config.pepper.as_deref())?;
        let organization = CreateOrganization::new(name, slug);

        self.provisioner.provision(&organization.namespace).await?;

        let created = self
            .organizations
            .create_with_owner(
                organization,
                OrganizationOwner::New(CreateUser {
                    email,
                    password_hash,
                    full_name: input.full_name,
                    is_superuser: true,
                }),
            )
            .await?;

        info!(
            user_id = %created.owner.id,
            organization_id = %created.organization.id,
            namespace = %created.organization.namespace,
            "Registered organization"
        );

        self.issue_pair(created.owner.id, created.organization.id)
            .await
    }

    /// Authenticate with email + password and issue a token pair bound
    /// to the user's first active membership.
    pub async fn login(&self, email: &str, password: &str) -> HubResult<TokenPair> {
        let user = match self.users.get_by_email(&email.trim().to_lowercase()).await {
            Ok(u) => u,
            Err(HubError::NotFound { .. }) => return Err(AuthError::InvalidCredentials.into()),
            Err(e) => return Err(e),
        };

        let valid =
            password::verify_password(password, &user.password_hash, self.config.pepper.as_deref())?;
        if !valid {
            return Err(AuthError::InvalidCredentials.into());
        }

        if !user.is_active {
            return Err(AuthError::AccountInactive.into());
        }

        let membership = self
            .memberships
            .first_active_for_user(user.id)
            .await?
            .ok_or(HubError::NoActiveMembership)?;

        info!(user_id = %user.id, organization_id = %membership.organization_id, "User logged in");

        self.issue_pair(user.id, membership.organization_id).await
    }

    /// Rotate a refresh token: revoke the presented one and issue a new
    /// pair, atomically.
    ///
    /// The new access token targets `preferred_organization` when the
    /// user has an active membership there, otherwise the user's first
    /// active membership.
    pub async fn refresh(
        &self,
        raw_refresh_token: &str,
        preferred_organization: Option<Uuid>,
    ) -> HubResult<TokenPair> {
        let claims = token::verify(raw_refresh_token, TokenType::Refresh, &self.config)?;
        let token_hash = token::hash_token(raw_refresh_token);

        let record = self.refresh_tokens.get_by_hash(&token_hash).await?;
        if record.user_id != claims.user_id || Some(record.jti) != claims.jti {
            return Err(HubError::InvalidToken(
                "refresh token does not match its record".into(),
            ));
        }
        if record.revoked {
            warn!(user_id = %record.user_id, jti = %record.jti, "Revoked refresh token presented");
            return Err(HubError::RevokedToken);
        }
        if record.expires_at <= Utc::now() {
            return Err(HubError::ExpiredToken);
        }

        let user = match self.users.get_by_id(record.user_id).await {
            Ok(user) => user,
            Err(HubError::NotFound { .. }) => {
                warn!(user_id = %record.user_id, "Refresh token for unknown user");
                return Err(HubError::InvalidToken("user not found".into()));
            }
            Err(e) => return Err(e),
        };
        // Known but deactivated accounts get a 403, not a 401.
        if !user.is_active {
            return Err(HubError::InactiveUser);
        }

        let membership = self
            .active_membership(user.id, preferred_organization)
            .await?;

        let issued = token::issue_refresh_token(user.id, &self.config)?;
        self.refresh_tokens
            .rotate(&token_hash, issued.record)
            .await?;
        let access_token =
            token::issue_access_token(user.id, membership.organization_id, &self.config)?;

        Ok(self.pair(access_token, issued.token))
    }

    /// Revoke a refresh token. Unknown or already-revoked tokens are a
    /// no-op.
    pub async fn logout(&self, raw_refresh_token: &str) -> HubResult<()> {
        let revoked = self
            .refresh_tokens
            .revoke(&token::hash_token(raw_refresh_token))
            .await?;
        if revoked {
            info!("Refresh token revoked");
        }
        Ok(())
    }

    /// Revoke every live refresh token of `user_id`.
    pub async fn logout_everywhere(&self, user_id: Uuid) -> HubResult<u64> {
        let count = self.refresh_tokens.revoke_all_for_user(user_id).await?;
        info!(user_id = %user_id, count, "Revoked all refresh tokens");
        Ok(count)
    }

    /// Delete refresh token records past their expiry.
    pub async fn purge_expired(&self) -> HubResult<u64> {
        self.refresh_tokens.purge_expired().await
    }

    /// Verify a bearer access token. Stateless.
    pub fn verify_access(&self, raw: &str) -> HubResult<AccessIdentity> {
        let VerifiedToken {
            user_id, tenant_id, ..
        } = token::verify(raw, TokenType::Access, &self.config)?;
        let tenant_id =
            tenant_id.ok_or_else(|| HubError::InvalidToken("missing tenant_id claim".into()))?;
        Ok(AccessIdentity { user_id, tenant_id })
    }

    /// The profile of the authenticated user.
    pub async fn me(&self, user_id: Uuid) -> HubResult<User> {
        self.users.get_by_id(user_id).await
    }

    async fn active_membership(
        &self,
        user_id: Uuid,
        preferred_organization: Option<Uuid>,
    ) -> HubResult<Membership> {
        if let Some(org_id) = preferred_organization {
            if let Some(m) = self.memberships.get(user_id, org_id).await? {
                if m.grants(&[MemberRole::Owner, MemberRole::Admin, MemberRole::Member]) {
                    return Ok(m);
                }
            }
        }
        self.memberships
            .first_active_for_user(user_id)
            .await?
            .ok_or(HubError::NoActiveMembership)
    }

    async fn issue_pair(&self, user_id: Uuid, organization_id: Uuid) -> HubResult<TokenPair> {
        let access_token = token::issue_access_token(user_id, organization_id, &self.config)?;
        let issued = token::issue_refresh_token(user_id, &self.config)?;
        self.refresh_tokens.create(issued.record).await?;
        Ok(self.pair(access_token, issued.token))
    }

    fn pair(&self, access_token: String, refresh_token: String) -> TokenPair {
        TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer",
            expires_in: self.config.access_token_lifetime_secs,
        }
    }
}

/// Trim and lowercase an email address, rejecting obviously invalid ones.
pub(crate) fn normalize_email(raw: &str) -> HubResult<String> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(HubError::Validation {
            message: format!("invalid email address: {raw}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for raw in ["", "alice", "@example.com", "alice@localhost"] {
            assert!(normalize_email(raw).is_err(), "{raw} accepted");
        }
    }
}
