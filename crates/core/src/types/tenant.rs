//! Tenant profile returned by the authentication endpoints.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The store account a session belongs to.
///
/// One session maps to exactly one tenant. The profile is persisted next to
/// the bearer token so the navigation bar can show who is signed in without
/// another round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantProfile {
    /// Login email of the tenant owner.
    pub email: String,
    /// Shopify store domain (e.g. `my-store.myshopify.com`).
    pub shop_domain: String,
}

impl TenantProfile {
    /// Create a new tenant profile.
    #[must_use]
    pub fn new(email: impl Into<String>, shop_domain: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            shop_domain: shop_domain.into(),
        }
    }
}

impl fmt::Display for TenantProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.email, self.shop_domain)
    }
}
