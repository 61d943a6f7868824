//! Request middleware.

pub mod tenant;

pub use tenant::{AuthOutcome, CurrentTenant, TenantContext, tenant_middleware};
