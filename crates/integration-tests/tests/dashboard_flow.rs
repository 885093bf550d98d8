//! Integration tests for dashboard snapshot loading.
//!
//! Run with: cargo test -p store-insights-integration-tests --test dashboard_flow

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use store_insights_client::{
    Credentials, DashboardOptions, DashboardOrchestrator, LoadOutcome, MemoryStorage, SessionGate,
    SessionStore,
};
use store_insights_core::RevenuePeriod;
use store_insights_integration_tests::{Endpoint, ScriptedBackend};

fn orchestrator(backend: &ScriptedBackend) -> Arc<DashboardOrchestrator<ScriptedBackend>> {
    Arc::new(DashboardOrchestrator::new(
        backend.clone(),
        DashboardOptions::default(),
    ))
}

/// Revenue of the single trend point encodes the period it was fetched for.
fn trend_days(outcome: &LoadOutcome) -> Decimal {
    outcome.snapshot().unwrap().revenue_trend[0].revenue
}

#[tokio::test]
async fn test_login_then_orders_failure_keeps_previous_snapshot() {
    let backend = ScriptedBackend::new();
    let store = SessionStore::open(MemoryStorage::default()).unwrap();
    let gate = SessionGate::new(backend.clone(), store);
    gate.login(&Credentials::new("owner@example.com", "hunter2"))
        .await
        .unwrap();
    assert!(gate.is_authenticated());

    let orchestrator = orchestrator(&backend);
    let first = orchestrator
        .load_snapshot(RevenuePeriod::Last30Days)
        .await
        .unwrap();
    assert_eq!(backend.calls().dashboard_total(), 4);
    let published = Arc::clone(first.snapshot().unwrap());

    backend.fail(Endpoint::OrdersByDate);
    let err = orchestrator
        .load_snapshot(RevenuePeriod::Last30Days)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Failed to load dashboard data. Please try again."
    );
    assert_eq!(backend.calls().dashboard_total(), 8);

    let state = orchestrator.state();
    assert_eq!(
        state.error.as_deref(),
        Some("Failed to load dashboard data. Please try again.")
    );
    assert!(!state.loading);
    let snapshot = state.snapshot.unwrap();
    assert_eq!(snapshot.generation, published.generation);
    assert_eq!(snapshot.orders_by_date, published.orders_by_date);
    assert_eq!(snapshot.overview, published.overview);
}

#[tokio::test]
async fn test_first_load_failure_shows_no_data() {
    let backend = ScriptedBackend::new();
    backend.fail(Endpoint::TopCustomers);
    let orchestrator = orchestrator(&backend);

    assert!(
        orchestrator
            .load_snapshot(RevenuePeriod::Last30Days)
            .await
            .is_err()
    );
    let state = orchestrator.state();
    assert!(state.snapshot.is_none());
    assert_eq!(state.generation(), 0);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn test_each_failing_query_leaves_generation_unchanged() {
    for endpoint in Endpoint::DASHBOARD {
        let backend = ScriptedBackend::new();
        let orchestrator = orchestrator(&backend);
        orchestrator
            .load_snapshot(RevenuePeriod::Last30Days)
            .await
            .unwrap();

        backend.fail(endpoint);
        assert!(orchestrator.refresh().await.is_err(), "{endpoint:?}");
        assert_eq!(orchestrator.state().generation(), 1, "{endpoint:?}");

        backend.recover(endpoint);
        orchestrator.refresh().await.unwrap();
        let state = orchestrator.state();
        assert_eq!(state.generation(), 3, "{endpoint:?}");
        assert!(state.error.is_none(), "{endpoint:?}");
    }
}

#[tokio::test]
async fn test_late_older_result_is_discarded() {
    let backend = ScriptedBackend::new();
    let orchestrator = orchestrator(&backend);
    backend.hold_period(RevenuePeriod::Last30Days);

    let initial = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.load_snapshot(RevenuePeriod::Last30Days).await }
    });
    backend.wait_for_calls(Endpoint::RevenueTrend, 1).await;
    assert!(orchestrator.state().is_initial_load());

    let changed = orchestrator
        .set_period(RevenuePeriod::Last7Days)
        .await
        .unwrap();
    assert_eq!(trend_days(&changed), Decimal::from(7));
    assert!(orchestrator.state().loading);

    backend.release_period(RevenuePeriod::Last30Days);
    let initial = initial.await.unwrap().unwrap();
    assert!(initial.is_superseded());

    let state = orchestrator.state();
    assert!(!state.loading);
    assert_eq!(state.period, RevenuePeriod::Last7Days);
    let snapshot = state.snapshot.unwrap();
    assert_eq!(snapshot.revenue_period, RevenuePeriod::Last7Days);
    assert_eq!(snapshot.generation, 2);
}

#[tokio::test]
async fn test_results_arriving_in_request_order_end_on_latest() {
    let backend = ScriptedBackend::new();
    let orchestrator = orchestrator(&backend);
    backend.hold_period(RevenuePeriod::Last30Days);
    backend.hold_period(RevenuePeriod::Last90Days);

    let older = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.load_snapshot(RevenuePeriod::Last30Days).await }
    });
    backend.wait_for_calls(Endpoint::RevenueTrend, 1).await;
    let newer = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.set_period(RevenuePeriod::Last90Days).await }
    });
    backend.wait_for_calls(Endpoint::RevenueTrend, 2).await;

    backend.release_period(RevenuePeriod::Last30Days);
    let older = older.await.unwrap().unwrap();
    assert!(!older.is_superseded());
    assert_eq!(orchestrator.state().generation(), 1);

    backend.release_period(RevenuePeriod::Last90Days);
    let newer = newer.await.unwrap().unwrap();
    assert_eq!(trend_days(&newer), Decimal::from(90));

    let snapshot = orchestrator.snapshot().unwrap();
    assert_eq!(snapshot.revenue_period, RevenuePeriod::Last90Days);
    assert_eq!(snapshot.generation, 2);
}

#[tokio::test]
async fn test_stale_failure_does_not_clobber_newer_snapshot() {
    let backend = ScriptedBackend::new();
    let orchestrator = orchestrator(&backend);
    backend.hold_period(RevenuePeriod::Last30Days);
    backend.fail(Endpoint::Overview);

    let older = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.load_snapshot(RevenuePeriod::Last30Days).await }
    });
    backend.wait_for_calls(Endpoint::RevenueTrend, 1).await;

    backend.recover(Endpoint::Overview);
    orchestrator
        .set_period(RevenuePeriod::Last7Days)
        .await
        .unwrap();

    backend.release_period(RevenuePeriod::Last30Days);
    let older = older.await.unwrap().unwrap();
    assert!(older.is_superseded());

    let state = orchestrator.state();
    assert!(state.error.is_none());
    assert_eq!(
        state.snapshot.unwrap().revenue_period,
        RevenuePeriod::Last7Days
    );
}

#[tokio::test]
async fn test_period_change_refetches_every_dataset() {
    let backend = ScriptedBackend::new();
    let orchestrator = orchestrator(&backend);
    orchestrator
        .load_snapshot(RevenuePeriod::Last30Days)
        .await
        .unwrap();

    for period in RevenuePeriod::ALL {
        orchestrator.set_period(period).await.unwrap();
    }

    let calls = backend.calls();
    for endpoint in Endpoint::DASHBOARD {
        assert_eq!(calls.count(endpoint), 4, "{endpoint:?}");
    }
    assert_eq!(orchestrator.state().period, RevenuePeriod::Last90Days);
}

#[tokio::test]
async fn test_top_customers_render_with_fallback_names() {
    let backend = ScriptedBackend::new();
    let orchestrator = orchestrator(&backend);
    let outcome = orchestrator
        .load_snapshot(RevenuePeriod::Last30Days)
        .await
        .unwrap();

    let rows: Vec<(usize, String)> = outcome
        .snapshot()
        .unwrap()
        .ranked_customers()
        .map(|(rank, customer)| (rank, customer.display_name()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (1, "Ada Lovelace".to_string()),
            (2, "grace@example.com".to_string()),
            (3, "Anonymous Customer".to_string()),
        ]
    );
}
