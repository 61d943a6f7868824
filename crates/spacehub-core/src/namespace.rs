//! Validated organization slugs and tenant namespace names.
//!
//! Tenant DDL and connection binding interpolate the namespace name
//! into query text (identifiers cannot be bound as parameters), so
//! [`NamespaceName`] is the only type those code paths accept. It can
//! only be obtained from a validated [`OrgSlug`] or by re-validating a
//! stored name.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::HubError;

/// Prefix shared by every tenant namespace.
pub const NAMESPACE_PREFIX: &str = "tenant_";

/// Maximum slug length. Keeps namespace names within 63 characters.
pub const MAX_SLUG_LEN: usize = 50;

/// Maximum namespace name length (PostgreSQL/SurrealDB-safe identifier).
pub const MAX_NAMESPACE_LEN: usize = 63;

/// URL-safe organization slug: lowercase ASCII letters and digits in
/// hyphen-separated groups (`acme`, `acme-north-2`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrgSlug(String);

impl OrgSlug {
    pub fn parse(raw: &str) -> Result<Self, HubError> {
        let invalid = |why: &str| HubError::Validation {
            message: format!("invalid organization slug '{raw}': {why}"),
        };

        if raw.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if raw.len() > MAX_SLUG_LEN {
            return Err(invalid("too long"));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid(
                "only lowercase letters, digits and hyphens are allowed",
            ));
        }
        if raw.starts_with('-') || raw.ends_with('-') || raw.contains("--") {
            return Err(invalid("hyphens must separate non-empty groups"));
        }

        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrgSlug {
    type Error = HubError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrgSlug> for String {
    fn from(slug: OrgSlug) -> Self {
        slug.0
    }
}

impl fmt::Display for OrgSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a tenant's isolated database, e.g. `tenant_acme_north`.
///
/// Always matches `^tenant_[a-z0-9_]+$` and is at most
/// [`MAX_NAMESPACE_LEN`] characters long.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Derive the namespace for an organization slug.
    ///
    /// Slugs never contain `_`, so mapping `-` to `_` is injective and
    /// two distinct slugs can never share a namespace.
    pub fn for_slug(slug: &OrgSlug) -> Self {
        Self(format!(
            "{NAMESPACE_PREFIX}{}",
            slug.as_str().replace('-', "_")
        ))
    }

    /// Re-validate a namespace name loaded from storage.
    pub fn parse(raw: &str) -> Result<Self, HubError> {
        let invalid = || HubError::Validation {
            message: format!("invalid namespace name '{raw}'"),
        };

        let suffix = raw.strip_prefix(NAMESPACE_PREFIX).ok_or_else(invalid)?;
        if suffix.is_empty()
            || raw.len() > MAX_NAMESPACE_LEN
            || !suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(invalid());
        }

        Ok(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
