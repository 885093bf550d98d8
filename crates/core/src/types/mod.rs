//! Core types for Store Insights.
//!
//! This module provides the wire and snapshot types for dashboard data.

pub mod customer;
pub mod metrics;
pub mod period;
pub mod sync;
pub mod tenant;

pub use customer::{CustomerId, CustomerRanking};
pub use metrics::{OrderPoint, OverviewMetrics, RevenuePoint};
pub use period::{DateRange, DateRangeError, ParsePeriodError, RevenuePeriod};
pub use sync::{SyncCounts, SyncResult};
pub use tenant::TenantProfile;
