//! Dashboard data orchestration.
//!
//! Coordinates the four insights queries into one consistent
//! [`DashboardSnapshot`], re-fetches when the revenue period changes, and
//! runs the mutually-exclusive Shopify sync.
//!
//! # Consistency
//!
//! - Each fetch is tagged with a generation number when it is issued
//! - A snapshot is only built when all four queries succeed
//! - Results settle last-request-wins: once generation N has settled, any
//!   result of a generation `<= N` is discarded on arrival
//! - State is published through a `watch` channel, one whole
//!   [`DashboardState`] at a time

pub mod orchestrator;

pub use orchestrator::DashboardOrchestrator;

use std::sync::Arc;

use store_insights_core::{
    CustomerRanking, DateRange, OrderPoint, OverviewMetrics, RevenuePeriod, RevenuePoint,
    SyncResult,
};
use thiserror::Error;

use crate::config::{ClientConfig, DEFAULT_TOP_CUSTOMERS_LIMIT};
use crate::gateway::GatewayError;

/// Shown when any of the dashboard queries fails.
pub const FETCH_FAILED: &str = "Failed to load dashboard data. Please try again.";
/// Shown when a sync fails without a backend-provided message.
pub const SYNC_FAILED: &str = "Sync failed. Please try again.";

/// Errors surfaced by the dashboard orchestrator.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// At least one of the four dashboard queries failed.
    #[error("Failed to load dashboard data. Please try again.")]
    Fetch(#[source] GatewayError),

    /// A sync is already running; no request was sent.
    #[error("A sync is already in progress")]
    SyncAlreadyInProgress,

    /// The sync request failed; carries the backend message if it sent one.
    #[error("{}", .0.as_deref().unwrap_or(SYNC_FAILED))]
    SyncFailed(Option<String>),
}

/// Query parameters that do not change with the selected period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    /// Range of the orders-by-date series.
    pub orders_range: DateRange,
    /// Size of the top-customers ranking.
    pub top_customers_limit: u32,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            orders_range: DateRange::default(),
            top_customers_limit: DEFAULT_TOP_CUSTOMERS_LIMIT,
        }
    }
}

impl From<&ClientConfig> for DashboardOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            orders_range: config.orders_range,
            top_customers_limit: config.top_customers_limit,
        }
    }
}

/// All dashboard datasets from one fetch generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSnapshot {
    /// Generation of the fetch that produced this snapshot.
    pub generation: u64,
    /// Period the revenue series was requested for.
    pub revenue_period: RevenuePeriod,
    pub overview: OverviewMetrics,
    pub revenue_trend: Vec<RevenuePoint>,
    pub orders_by_date: Vec<OrderPoint>,
    /// Pre-sorted by spend, descending.
    pub top_customers: Vec<CustomerRanking>,
}

impl DashboardSnapshot {
    /// Top customers with their 1-based rank.
    pub fn ranked_customers(&self) -> impl Iterator<Item = (usize, &CustomerRanking)> {
        self.top_customers
            .iter()
            .enumerate()
            .map(|(index, customer)| (index + 1, customer))
    }
}

/// Everything a renderer needs to draw the dashboard.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    /// Latest published snapshot; kept across failed fetches.
    pub snapshot: Option<Arc<DashboardSnapshot>>,
    /// Currently selected revenue period.
    pub period: RevenuePeriod,
    /// At least one fetch is in flight.
    pub loading: bool,
    /// A sync is in flight.
    pub syncing: bool,
    /// User-visible error from the last failed operation.
    pub error: Option<String>,
    /// Counts of the last successful sync, for the confirmation message.
    pub last_sync: Option<SyncResult>,
    /// Operation that raised `error`.
    error_source: Option<ErrorSource>,
    in_flight: usize,
    settled: u64,
}

/// Which operation set the visible error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorSource {
    Fetch,
    Sync,
}

impl DashboardState {
    /// Generation of the published snapshot, `0` before the first one.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.snapshot.as_ref().map_or(0, |snapshot| snapshot.generation)
    }

    /// Whether the initial load is still running (nothing to show yet).
    #[must_use]
    pub const fn is_initial_load(&self) -> bool {
        self.loading && self.snapshot.is_none()
    }

    fn raise(&mut self, source: ErrorSource, message: String) {
        self.error = Some(message);
        self.error_source = Some(source);
    }

    fn clear_error(&mut self) {
        self.error = None;
        self.error_source = None;
    }

    /// Clear the error only if `source` raised it.
    fn clear_error_from(&mut self, source: ErrorSource) {
        if self.error_source == Some(source) {
            self.clear_error();
        }
    }
}

/// How a `load_snapshot` call ended when it did not fail.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The fetch produced the current snapshot.
    Published(Arc<DashboardSnapshot>),
    /// A newer fetch settled first; this result was discarded.
    Superseded {
        /// Generation of the discarded fetch.
        generation: u64,
    },
}

impl LoadOutcome {
    /// The published snapshot, if this fetch produced one.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Arc<DashboardSnapshot>> {
        match self {
            Self::Published(snapshot) => Some(snapshot),
            Self::Superseded { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}
