//! Top-customer ranking entries.
//!
//! The backend returns customers pre-sorted by spend, so the rank of an entry
//! is its position in the list. Display names are derived on demand and never
//! stored.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Shown when a customer has neither a full name nor an email.
pub const ANONYMOUS_CUSTOMER: &str = "Anonymous Customer";

/// Customer identifier as returned by the backend.
///
/// Accepts both JSON strings and integers, since ingested Shopify IDs are
/// numeric while local IDs are opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CustomerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => Self(s),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Unsigned(n) => Self(n.to_string()),
        })
    }
}

/// One entry of the top-customers ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRanking {
    pub id: CustomerId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub total_spent: Decimal,
    pub orders_count: u64,
}

impl CustomerRanking {
    /// Name to show for this customer.
    ///
    /// Full name when both parts are present, otherwise the email, otherwise
    /// [`ANONYMOUS_CUSTOMER`].
    #[must_use]
    pub fn display_name(&self) -> String {
        let first = non_empty(self.first_name.as_deref());
        let last = non_empty(self.last_name.as_deref());
        match (first, last) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            _ => non_empty(self.email.as_deref())
                .map_or_else(|| ANONYMOUS_CUSTOMER.to_string(), str::to_string),
        }
    }

    /// Email to show under the display name, if it adds information.
    #[must_use]
    pub fn secondary_email(&self) -> Option<&str> {
        let email = non_empty(self.email.as_deref())?;
        (email != self.display_name()).then_some(email)
    }

    /// Whether the customer can be contacted or identified at all.
    #[must_use]
    pub fn has_contact_info(&self) -> bool {
        non_empty(self.email.as_deref()).is_some()
            || non_empty(self.first_name.as_deref()).is_some()
    }

    /// Order count with the right plural, e.g. `1 order`, `3 orders`.
    #[must_use]
    pub fn orders_label(&self) -> String {
        if self.orders_count == 1 {
            "1 order".to_string()
        } else {
            format!("{} orders", self.orders_count)
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}
