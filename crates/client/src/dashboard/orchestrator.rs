//! Snapshot loading, period changes and the guarded sync.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use store_insights_core::{
    CustomerRanking, OrderPoint, OverviewMetrics, RevenuePeriod, RevenuePoint, SyncResult,
};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use super::{
    DashboardError, DashboardOptions, DashboardSnapshot, DashboardState, ErrorSource, FETCH_FAILED,
    LoadOutcome,
};
use crate::gateway::{GatewayError, InsightsBackend};

/// Keeps a [`DashboardSnapshot`] current for the active session.
///
/// All operations take `&self` and may run concurrently on one task: a
/// period change while a fetch is in flight, or a refresh while a sync is
/// running.
pub struct DashboardOrchestrator<B> {
    backend: B,
    options: DashboardOptions,
    /// Last generation handed out to a fetch.
    issued: AtomicU64,
    state: watch::Sender<DashboardState>,
}

impl<B: InsightsBackend> DashboardOrchestrator<B> {
    #[must_use]
    pub fn new(backend: B, options: DashboardOptions) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        Self {
            backend,
            options,
            issued: AtomicU64::new(0),
            state,
        }
    }

    /// Fetch all four datasets for `period` and publish them as one snapshot.
    ///
    /// On failure the previous snapshot stays published and the state carries
    /// a single error message. A result that settles after a newer fetch has
    /// already settled is discarded and reported as
    /// [`LoadOutcome::Superseded`].
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Fetch` with the first failing query's error.
    #[instrument(skip(self), fields(period = %period))]
    pub async fn load_snapshot(&self, period: RevenuePeriod) -> Result<LoadOutcome, DashboardError> {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let fetch = FetchGuard::start(&self.state, period);
        debug!(generation, "Fetching dashboard data");

        let (overview, revenue_trend, orders_by_date, top_customers) = tokio::join!(
            self.backend.overview(),
            self.backend.revenue_trend(period),
            self.backend.orders_by_date(self.options.orders_range),
            self.backend.top_customers(self.options.top_customers_limit),
        );
        let fetched = assemble(
            generation,
            period,
            overview,
            revenue_trend,
            orders_by_date,
            top_customers,
        );

        let mut applied = false;
        fetch.settle(|state| {
            if generation <= state.settled {
                return;
            }
            state.settled = generation;
            applied = true;
            match &fetched {
                Ok(snapshot) => {
                    state.snapshot = Some(Arc::clone(snapshot));
                    // A sync failure raised while this fetch ran stays visible.
                    state.clear_error_from(ErrorSource::Fetch);
                }
                Err(_) => state.raise(ErrorSource::Fetch, FETCH_FAILED.to_string()),
            }
        });

        if !applied {
            debug!(generation, "Discarding superseded dashboard fetch");
            return Ok(LoadOutcome::Superseded { generation });
        }

        match fetched {
            Ok(snapshot) => {
                info!(generation, "Published dashboard snapshot");
                Ok(LoadOutcome::Published(snapshot))
            }
            Err(e) => Err(DashboardError::Fetch(e)),
        }
    }

    /// Select a new revenue period and re-fetch every dataset for it.
    ///
    /// All four queries are re-issued, not just the revenue series, so the
    /// published snapshot never mixes periods.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_snapshot`].
    pub async fn set_period(&self, period: RevenuePeriod) -> Result<LoadOutcome, DashboardError> {
        self.load_snapshot(period).await
    }

    /// Re-fetch for the currently selected period.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_snapshot`].
    pub async fn refresh(&self) -> Result<LoadOutcome, DashboardError> {
        let period = self.state.borrow().period;
        self.load_snapshot(period).await
    }

    /// Trigger a Shopify ingestion run, then refresh the dashboard.
    ///
    /// Only one sync may run at a time. The refresh after a successful sync
    /// is awaited before returning; its failure is reported through the
    /// dashboard state, not through this result.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::SyncAlreadyInProgress` without sending a
    /// request if a sync is running, and `DashboardError::SyncFailed` if the
    /// backend rejects or cannot be reached.
    #[instrument(skip(self))]
    pub async fn sync(&self) -> Result<SyncResult, DashboardError> {
        let Some(guard) = SyncGuard::acquire(&self.state) else {
            warn!("Sync requested while another sync is running");
            return Err(DashboardError::SyncAlreadyInProgress);
        };

        info!("Starting Shopify sync");
        let outcome = self.backend.sync().await;
        drop(guard);

        match outcome {
            Ok(result) => {
                info!(
                    customers = result.counts.customers,
                    products = result.counts.products,
                    orders = result.counts.orders,
                    "Shopify sync completed"
                );
                self.state.send_modify(|state| state.last_sync = Some(result));
                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "Refresh after sync failed");
                }
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, "Shopify sync failed");
                let messages = e.remote_messages();
                let err = DashboardError::SyncFailed(
                    (!messages.is_empty()).then(|| messages.join(", ")),
                );
                let message = err.to_string();
                self.state
                    .send_modify(|state| state.raise(ErrorSource::Sync, message));
                Err(err)
            }
        }
    }

    /// Current dashboard state.
    #[must_use]
    pub fn state(&self) -> DashboardState {
        self.state.borrow().clone()
    }

    /// Latest published snapshot, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.state.borrow().snapshot.clone()
    }

    /// Observe state changes; every observed value is a whole state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    #[must_use]
    pub const fn options(&self) -> &DashboardOptions {
        &self.options
    }
}

/// Build a snapshot from the four query results, or return the first error.
fn assemble(
    generation: u64,
    period: RevenuePeriod,
    overview: Result<OverviewMetrics, GatewayError>,
    revenue_trend: Result<Vec<RevenuePoint>, GatewayError>,
    orders_by_date: Result<Vec<OrderPoint>, GatewayError>,
    top_customers: Result<Vec<CustomerRanking>, GatewayError>,
) -> Result<Arc<DashboardSnapshot>, GatewayError> {
    for (query, failure) in [
        ("overview", overview.as_ref().err()),
        ("revenue-trend", revenue_trend.as_ref().err()),
        ("orders-by-date", orders_by_date.as_ref().err()),
        ("top-customers", top_customers.as_ref().err()),
    ] {
        if let Some(e) = failure {
            error!(generation, query, error = %e, "Dashboard query failed");
        }
    }

    Ok(Arc::new(DashboardSnapshot {
        generation,
        revenue_period: period,
        overview: overview?,
        revenue_trend: revenue_trend?,
        orders_by_date: orders_by_date?,
        top_customers: top_customers?,
    }))
}

/// Counts one fetch as in flight until it settles or its future is dropped.
struct FetchGuard<'a> {
    state: &'a watch::Sender<DashboardState>,
    active: bool,
}

impl<'a> FetchGuard<'a> {
    fn start(state: &'a watch::Sender<DashboardState>, period: RevenuePeriod) -> Self {
        state.send_modify(|current| {
            current.period = period;
            current.in_flight += 1;
            current.loading = true;
            current.clear_error();
        });
        Self {
            state,
            active: true,
        }
    }

    /// Release the fetch and apply its result in one state update.
    fn settle(mut self, apply: impl FnOnce(&mut DashboardState)) {
        self.active = false;
        self.state.send_modify(|current| {
            release_fetch(current);
            apply(current);
        });
    }
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        if self.active {
            self.state.send_modify(release_fetch);
        }
    }
}

fn release_fetch(state: &mut DashboardState) {
    state.in_flight = state.in_flight.saturating_sub(1);
    state.loading = state.in_flight > 0;
}

/// Holds the `syncing` flag; releases it on drop, including when the sync
/// future is dropped mid-flight.
struct SyncGuard<'a> {
    state: &'a watch::Sender<DashboardState>,
}

impl<'a> SyncGuard<'a> {
    fn acquire(state: &'a watch::Sender<DashboardState>) -> Option<Self> {
        let acquired = state.send_if_modified(|current| {
            if current.syncing {
                return false;
            }
            current.syncing = true;
            current.clear_error();
            true
        });
        acquired.then_some(Self { state })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|state| state.syncing = false);
    }
}
