//! Integration tests for Store Insights.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p store-insights-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `dashboard_flow` - snapshot loading, period changes and supersession
//! - `sync_flow` - the guarded Shopify sync and its follow-up refresh
//! - `session_flow` - login, logout and rehydration across store instances
//! - `http_end_to_end` - the real HTTP gateway against a loopback backend
//!
//! Everything except `http_end_to_end` runs against [`ScriptedBackend`], an
//! in-process backend whose responses, failures and timing are controlled by
//! the test.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use store_insights_client::{AuthPayload, Credentials, GatewayError, InsightsBackend, Registration};
use store_insights_core::{
    CustomerId, CustomerRanking, DateRange, OrderPoint, OverviewMetrics, RevenuePeriod,
    RevenuePoint, SyncCounts, SyncResult, TenantProfile,
};
use tokio::sync::{Notify, watch};

/// How long [`ScriptedBackend::wait_for_calls`] waits before giving up.
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

/// Remote endpoints of the insights backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Register,
    Login,
    Overview,
    RevenueTrend,
    OrdersByDate,
    TopCustomers,
    Sync,
}

impl Endpoint {
    /// The four endpoints behind one dashboard snapshot.
    pub const DASHBOARD: [Self; 4] = [
        Self::Overview,
        Self::RevenueTrend,
        Self::OrdersByDate,
        Self::TopCustomers,
    ];
}

/// Number of calls per endpoint.
#[derive(Debug, Clone, Default)]
pub struct CallLog(HashMap<Endpoint, usize>);

impl CallLog {
    #[must_use]
    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.0.get(&endpoint).copied().unwrap_or(0)
    }

    /// Calls across the four dashboard endpoints.
    #[must_use]
    pub fn dashboard_total(&self) -> usize {
        Endpoint::DASHBOARD.iter().map(|e| self.count(*e)).sum()
    }
}

struct Script {
    auth: Mutex<Result<AuthPayload, GatewayError>>,
    failing: Mutex<HashSet<Endpoint>>,
    held_periods: Mutex<HashMap<RevenuePeriod, Arc<Notify>>>,
    held_sync: Mutex<Option<Arc<Notify>>>,
    sync_outcome: Mutex<Result<SyncResult, GatewayError>>,
    /// Bumped on every response so each snapshot's data is distinguishable.
    orders_version: Mutex<u32>,
    calls: watch::Sender<CallLog>,
}

/// Scriptable in-process insights backend.
///
/// Clones share one script, so a test keeps a handle while the gate or the
/// orchestrator owns another.
#[derive(Clone)]
pub struct ScriptedBackend {
    script: Arc<Script>,
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBackend {
    /// Backend that accepts any login and serves a small store.
    #[must_use]
    pub fn new() -> Self {
        let (calls, _) = watch::channel(CallLog::default());
        Self {
            script: Arc::new(Script {
                auth: Mutex::new(Ok(AuthPayload {
                    token: Some("tok_integration".to_string()),
                    tenant: Some(tenant()),
                })),
                failing: Mutex::new(HashSet::new()),
                held_periods: Mutex::new(HashMap::new()),
                held_sync: Mutex::new(None),
                sync_outcome: Mutex::new(Ok(SyncResult {
                    counts: SyncCounts {
                        customers: 3,
                        products: 10,
                        orders: 25,
                    },
                })),
                orders_version: Mutex::new(0),
                calls,
            }),
        }
    }

    /// Make register and login answer with `outcome`.
    pub fn set_auth(&self, outcome: Result<AuthPayload, GatewayError>) {
        *lock(&self.script.auth) = outcome;
    }

    /// Make `endpoint` fail with a transport error until [`Self::recover`].
    pub fn fail(&self, endpoint: Endpoint) {
        lock(&self.script.failing).insert(endpoint);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        lock(&self.script.failing).remove(&endpoint);
    }

    /// Park revenue-trend requests for `period` until [`Self::release_period`].
    pub fn hold_period(&self, period: RevenuePeriod) {
        lock(&self.script.held_periods).insert(period, Arc::new(Notify::new()));
    }

    pub fn release_period(&self, period: RevenuePeriod) {
        if let Some(gate) = lock(&self.script.held_periods).remove(&period) {
            gate.notify_one();
        }
    }

    /// Park sync requests until [`Self::release_sync`].
    pub fn hold_sync(&self) {
        *lock(&self.script.held_sync) = Some(Arc::new(Notify::new()));
    }

    pub fn release_sync(&self) {
        if let Some(gate) = lock(&self.script.held_sync).take() {
            gate.notify_one();
        }
    }

    pub fn set_sync_outcome(&self, outcome: Result<SyncResult, GatewayError>) {
        *lock(&self.script.sync_outcome) = outcome;
    }

    /// Calls made so far.
    #[must_use]
    pub fn calls(&self) -> CallLog {
        self.script.calls.borrow().clone()
    }

    /// Wait until `endpoint` has been called at least `count` times.
    ///
    /// # Panics
    ///
    /// Panics if that does not happen within [`WAIT_LIMIT`].
    pub async fn wait_for_calls(&self, endpoint: Endpoint, count: usize) {
        let mut rx = self.script.calls.subscribe();
        let reached = tokio::time::timeout(WAIT_LIMIT, rx.wait_for(|log| log.count(endpoint) >= count));
        assert!(
            matches!(reached.await, Ok(Ok(_))),
            "{endpoint:?} was not called {count} times"
        );
    }

    fn record(&self, endpoint: Endpoint) -> Result<(), GatewayError> {
        self.script.calls.send_modify(|log| *log.0.entry(endpoint).or_default() += 1);
        if lock(&self.script.failing).contains(&endpoint) {
            return Err(GatewayError::Transport(format!("{endpoint:?} unavailable")));
        }
        Ok(())
    }
}

impl InsightsBackend for ScriptedBackend {
    async fn register(&self, _registration: &Registration) -> Result<AuthPayload, GatewayError> {
        self.record(Endpoint::Register)?;
        lock(&self.script.auth).clone()
    }

    async fn login(&self, _credentials: &Credentials) -> Result<AuthPayload, GatewayError> {
        self.record(Endpoint::Login)?;
        lock(&self.script.auth).clone()
    }

    async fn overview(&self) -> Result<OverviewMetrics, GatewayError> {
        self.record(Endpoint::Overview)?;
        Ok(OverviewMetrics {
            total_customers: 3,
            total_orders: 25,
            total_revenue: Decimal::new(125_050, 2),
            avg_order_value: Decimal::new(5_002, 2),
        })
    }

    async fn revenue_trend(&self, period: RevenuePeriod) -> Result<Vec<RevenuePoint>, GatewayError> {
        let held = lock(&self.script.held_periods).get(&period).cloned();
        self.record(Endpoint::RevenueTrend)?;
        if let Some(gate) = held {
            gate.notified().await;
        }
        Ok(vec![RevenuePoint {
            date: day(2025, 1, 1),
            revenue: Decimal::from(period.days()),
        }])
    }

    async fn orders_by_date(&self, range: DateRange) -> Result<Vec<OrderPoint>, GatewayError> {
        self.record(Endpoint::OrdersByDate)?;
        let version = {
            let mut version = lock(&self.script.orders_version);
            *version += 1;
            *version
        };
        Ok(vec![OrderPoint {
            date: range.start(),
            order_count: u64::from(version),
            revenue: Decimal::from(version) * Decimal::TEN,
        }])
    }

    async fn top_customers(&self, limit: u32) -> Result<Vec<CustomerRanking>, GatewayError> {
        self.record(Endpoint::TopCustomers)?;
        let customers = vec![
            customer("101", Some("Ada"), Some("Lovelace"), Some("ada@example.com"), 90_000),
            customer("102", None, None, Some("grace@example.com"), 45_000),
            customer("103", None, None, None, 12_500),
        ];
        Ok(customers.into_iter().take(limit as usize).collect())
    }

    async fn sync(&self) -> Result<SyncResult, GatewayError> {
        let held = lock(&self.script.held_sync).clone();
        self.record(Endpoint::Sync)?;
        if let Some(gate) = held {
            gate.notified().await;
        }
        lock(&self.script.sync_outcome).clone()
    }
}

/// Tenant returned by the default auth script.
#[must_use]
pub fn tenant() -> TenantProfile {
    TenantProfile::new("owner@example.com", "example.myshopify.com")
}

fn customer(
    id: &str,
    first_name: Option<&str>,
    last_name: Option<&str>,
    email: Option<&str>,
    cents: i64,
) -> CustomerRanking {
    CustomerRanking {
        id: CustomerId::new(id),
        first_name: first_name.map(str::to_string),
        last_name: last_name.map(str::to_string),
        email: email.map(str::to_string),
        total_spent: Decimal::new(cents, 2),
        orders_count: 1,
    }
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
