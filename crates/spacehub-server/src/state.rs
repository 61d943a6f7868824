//! Shared application state.

use spacehub_auth::{AuthConfig, AuthService, MembershipGuard};
use spacehub_db::DbPool;
use spacehub_db::SurrealNamespaceProvisioner;
use spacehub_db::repository::{
    SurrealMembershipRepository, SurrealOrganizationRepository, SurrealRefreshTokenRepository,
    SurrealSpaceRepository, SurrealUserRepository,
};
use surrealdb::engine::any::Any;

pub type Users = SurrealUserRepository<Any>;
pub type Organizations = SurrealOrganizationRepository<Any>;
pub type Memberships = SurrealMembershipRepository<Any>;
pub type Provisioner = SurrealNamespaceProvisioner<Any>;

pub type Auth =
    AuthService<Users, Organizations, Memberships, SurrealRefreshTokenRepository<Any>, Provisioner>;
pub type Guard = MembershipGuard<Users, Organizations, Memberships, Provisioner>;

/// Application state shared across handlers.
pub struct AppState {
    pub auth: Auth,
    pub guard: Guard,
    pub organizations: Organizations,
    pub spaces: SurrealSpaceRepository<Any>,
    pub provisioner: Provisioner,
}

impl AppState {
    pub fn new(pool: DbPool<Any>, auth_config: AuthConfig) -> Self {
        let provisioner = SurrealNamespaceProvisioner::new(pool.clone());
        Self {
            auth: AuthService::new(
                SurrealUserRepository::new(pool.clone()),
                SurrealOrganizationRepository::new(pool.clone()),
                SurrealMembershipRepository::new(pool.clone()),
                SurrealRefreshTokenRepository::new(pool.clone()),
                provisioner.clone(),
                auth_config,
            ),
            guard: MembershipGuard::new(
                SurrealUserRepository::new(pool.clone()),
                SurrealOrganizationRepository::new(pool.clone()),
                SurrealMembershipRepository::new(pool.clone()),
                provisioner.clone(),
            ),
            organizations: SurrealOrganizationRepository::new(pool.clone()),
            spaces: SurrealSpaceRepository::new(pool),
            provisioner,
        }
    }
}
