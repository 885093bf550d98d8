//! Result of a Shopify ingestion run.

use serde::{Deserialize, Serialize};

/// Number of records ingested per resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncCounts {
    pub customers: u64,
    pub products: u64,
    pub orders: u64,
}

/// Response of `POST /shopify/sync`.
///
/// Transient: consumed once for the confirmation message and to trigger a
/// dashboard refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncResult {
    pub counts: SyncCounts,
}

impl SyncResult {
    /// Confirmation text shown after a successful sync.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Sync completed!\nCustomers: {}\nProducts: {}\nOrders: {}",
            self.counts.customers, self.counts.products, self.counts.orders
        )
    }
}
