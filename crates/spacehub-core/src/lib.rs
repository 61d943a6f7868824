//! SpaceHub Core: domain models, validated tenant identifiers, error
//! taxonomy and repository traits shared by all crates.

pub mod error;
pub mod models;
pub mod namespace;
pub mod repository;

pub use error::{HubError, HubResult};
pub use namespace::{NamespaceName, OrgSlug};
