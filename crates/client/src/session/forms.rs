//! Login and registration payloads collected by the forms.
//!
//! The only validation done here is required-field presence; everything else
//! is the backend's call.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Email + password pair for `login`.
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Names of required fields that are empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if is_blank(&self.email) {
            missing.push("email");
        }
        if is_blank(self.password.expose_secret()) {
            missing.push("password");
        }
        missing
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// New tenant signup: account credentials plus the Shopify connection.
pub struct Registration {
    pub email: String,
    pub password: SecretString,
    /// Shopify store domain (e.g. `my-store.myshopify.com`).
    pub shop_domain: String,
    /// Shopify Admin API access token used by the backend for ingestion.
    pub access_token: SecretString,
}

impl Registration {
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        shop_domain: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
            shop_domain: shop_domain.into(),
            access_token: SecretString::from(access_token.into()),
        }
    }

    /// Names of required fields that are empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("email", is_blank(&self.email)),
            ("password", is_blank(self.password.expose_secret())),
            ("shopDomain", is_blank(&self.shop_domain)),
            ("accessToken", is_blank(self.access_token.expose_secret())),
        ]
        .into_iter()
        .filter_map(|(name, blank)| blank.then_some(name))
        .collect()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
