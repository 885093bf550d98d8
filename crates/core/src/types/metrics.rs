//! Overview metrics and time-series points.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Store-wide totals shown in the metric tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OverviewMetrics {
    /// Number of customers ingested for the tenant.
    pub total_customers: u64,
    /// Number of orders ingested for the tenant.
    pub total_orders: u64,
    /// Sum of order totals.
    pub total_revenue: Decimal,
    /// Average order value.
    pub avg_order_value: Decimal,
}

/// Revenue for a single day of the selected period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub revenue: Decimal,
}

/// Order volume and revenue for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPoint {
    pub date: NaiveDate,
    pub order_count: u64,
    pub revenue: Decimal,
}
