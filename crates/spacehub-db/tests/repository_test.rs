//! Integration tests for the identity repositories using in-memory SurrealDB.

use spacehub_core::HubError;
use spacehub_core::models::membership::{CreateMembership, MemberRole, MembershipStatus};
use spacehub_core::models::organization::CreateOrganization;
use spacehub_core::models::user::CreateUser;
use spacehub_core::namespace::OrgSlug;
use spacehub_core::repository::{
    MembershipRepository, NamespaceProvisioner, OrganizationOwner, OrganizationRepository,
    UserRepository,
};
use spacehub_db::repository::{
    SurrealMembershipRepository, SurrealOrganizationRepository, SurrealUserRepository,
};
use spacehub_db::{DbPool, SurrealNamespaceProvisioner, migrate};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

async fn setup() -> DbPool<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    let pool = DbPool::single(db, "test", "identity");
    migrate(&pool).await.unwrap();
    pool
}

fn new_user(email: &str) -> CreateUser {
    CreateUser {
        email: email.into(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        full_name: Some("Test User".into()),
        is_superuser: false,
    }
}

fn new_org(name: &str, slug: &str) -> CreateOrganization {
    CreateOrganization::new(name, OrgSlug::parse(slug).unwrap())
}

#[tokio::test]
async fn create_and_fetch_user() {
    let users = SurrealUserRepository::new(setup().await);

    let created = users.create(new_user("alice@example.com")).await.unwrap();
    assert!(created.is_active);
    assert!(!created.is_superuser);

    let by_id = users.get_by_id(created.id).await.unwrap();
    assert_eq!(by_id.email, "alice@example.com");

    let by_email = users.get_by_email("alice@example.com").await.unwrap();
    assert_eq!(by_email.id, created.id);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let users = SurrealUserRepository::new(setup().await);

    users.create(new_user("alice@example.com")).await.unwrap();
    let err = users.create(new_user("alice@example.com")).await.unwrap_err();
    assert!(matches!(err, HubError::DuplicateEmail), "got {err:?}");
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let users = SurrealUserRepository::new(setup().await);

    let err = users.get_by_email("ghost@example.com").await.unwrap_err();
    assert!(matches!(err, HubError::NotFound { .. }));
}

#[tokio::test]
async fn deactivate_user() {
    let users = SurrealUserRepository::new(setup().await);

    let user = users.create(new_user("alice@example.com")).await.unwrap();
    let updated = users.set_active(user.id, false).await.unwrap();
    assert!(!updated.is_active);
    assert!(!users.get_by_id(user.id).await.unwrap().is_active);
}

#[tokio::test]
async fn create_organization_with_new_owner() {
    let pool = setup().await;
    let orgs = SurrealOrganizationRepository::new(pool.clone());
    let memberships = SurrealMembershipRepository::new(pool);

    let mut owner = new_user("owner@acme.test");
    owner.is_superuser = true;
    let created = orgs
        .create_with_owner(new_org("Acme", "acme-co"), OrganizationOwner::New(owner))
        .await
        .unwrap();

    assert_eq!(created.organization.slug.as_str(), "acme-co");
    assert_eq!(created.organization.namespace.as_str(), "tenant_acme_co");
    assert!(created.owner.is_superuser);
    assert_eq!(created.membership.role, MemberRole::Owner);
    assert_eq!(created.membership.status, MembershipStatus::Active);
    assert_eq!(created.membership.user_id, created.owner.id);
    assert_eq!(created.membership.organization_id, created.organization.id);

    let first = memberships
        .first_active_for_user(created.owner.id)
        .await
        .unwrap()
        .expect("owner has an active membership");
    assert_eq!(first.id, created.membership.id);
}

#[tokio::test]
async fn duplicate_slug_writes_nothing() {
    let pool = setup().await;
    let orgs = SurrealOrganizationRepository::new(pool.clone());
    let users = SurrealUserRepository::new(pool);

    orgs.create_with_owner(
        new_org("Acme", "acme-co"),
        OrganizationOwner::New(new_user("first@acme.test")),
    )
    .await
    .unwrap();

    let err = orgs
        .create_with_owner(
            new_org("Acme Again", "acme-co"),
            OrganizationOwner::New(new_user("second@acme.test")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::DuplicateSlug), "got {err:?}");

    // The owner from the failed transaction was rolled back.
    let err = users.get_by_email("second@acme.test").await.unwrap_err();
    assert!(matches!(err, HubError::NotFound { .. }));
    assert_eq!(orgs.list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_owner_email_writes_nothing() {
    let pool = setup().await;
    let orgs = SurrealOrganizationRepository::new(pool);

    orgs.create_with_owner(
        new_org("Acme", "acme-co"),
        OrganizationOwner::New(new_user("owner@acme.test")),
    )
    .await
    .unwrap();

    let err = orgs
        .create_with_owner(
            new_org("Globex", "globex"),
            OrganizationOwner::New(new_user("owner@acme.test")),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::DuplicateEmail), "got {err:?}");

    let slug = OrgSlug::parse("globex").unwrap();
    assert!(orgs.get_by_slug(&slug).await.is_err());
}

#[tokio::test]
async fn existing_user_can_own_second_organization() {
    let pool = setup().await;
    let orgs = SurrealOrganizationRepository::new(pool.clone());
    let memberships = SurrealMembershipRepository::new(pool);

    let first = orgs
        .create_with_owner(
            new_org("Acme", "acme-co"),
            OrganizationOwner::New(new_user("owner@acme.test")),
        )
        .await
        .unwrap();
    let second = orgs
        .create_with_owner(
            new_org("Globex", "globex"),
            OrganizationOwner::Existing(first.owner.id),
        )
        .await
        .unwrap();
    assert_eq!(second.owner.id, first.owner.id);

    let listed = memberships.list_for_user(first.owner.id).await.unwrap();
    let slugs: Vec<&str> = listed.iter().map(|m| m.organization.slug.as_str()).collect();
    assert_eq!(slugs, vec!["acme-co", "globex"]);
    assert!(listed.iter().all(|m| m.role == MemberRole::Owner));
}

#[tokio::test]
async fn existing_owner_must_exist() {
    let orgs = SurrealOrganizationRepository::new(setup().await);

    let err = orgs
        .create_with_owner(
            new_org("Acme", "acme-co"),
            OrganizationOwner::Existing(uuid::Uuid::new_v4()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, HubError::NotFound { .. }));
}

#[tokio::test]
async fn duplicate_membership_is_already_member() {
    let pool = setup().await;
    let orgs = SurrealOrganizationRepository::new(pool.clone());
    let users = SurrealUserRepository::new(pool.clone());
    let memberships = SurrealMembershipRepository::new(pool);

    let created = orgs
        .create_with_owner(
            new_org("Acme", "acme-co"),
            OrganizationOwner::New(new_user("owner@acme.test")),
        )
        .await
        .unwrap();
    let bob = users.create(new_user("bob@acme.test")).await.unwrap();

    let input = CreateMembership {
        user_id: bob.id,
        organization_id: created.organization.id,
        role: MemberRole::Member,
        status: MembershipStatus::Active,
    };
    let membership = memberships.create(input.clone()).await.unwrap();
    assert_eq!(membership.role, MemberRole::Member);

    let err = memberships.create(input).await.unwrap_err();
    assert!(matches!(err, HubError::AlreadyMember), "got {err:?}");

    let found = memberships
        .get(bob.id, created.organization.id)
        .await
        .unwrap()
        .expect("membership exists");
    assert_eq!(found.id, membership.id);
}

#[tokio::test]
async fn user_without_memberships_has_no_active_membership() {
    let pool = setup().await;
    let users = SurrealUserRepository::new(pool.clone());
    let memberships = SurrealMembershipRepository::new(pool);

    let loner = users.create(new_user("loner@example.com")).await.unwrap();
    assert!(
        memberships
            .first_active_for_user(loner.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(memberships.list_for_user(loner.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn repair_reprovisions_every_organization_namespace() {
    let pool = setup().await;
    let orgs = SurrealOrganizationRepository::new(pool.clone());
    let provisioner = SurrealNamespaceProvisioner::new(pool);

    for (name, slug, email) in [
        ("Acme", "acme-co", "a@acme.test"),
        ("Globex", "globex", "g@globex.test"),
    ] {
        let created = orgs
            .create_with_owner(new_org(name, slug), OrganizationOwner::New(new_user(email)))
            .await
            .unwrap();
        provisioner.provision(&created.organization.namespace).await.unwrap();
    }

    let repaired = provisioner.repair_all().await.unwrap();
    let names: Vec<&str> = repaired.iter().map(|ns| ns.as_str()).collect();
    assert_eq!(names, vec!["tenant_acme_co", "tenant_globex"]);

    for ns in &repaired {
        assert!(provisioner.describe(ns).await.unwrap().is_complete());
    }
}
