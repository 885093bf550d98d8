//! Dashboard and sync commands.
//!
//! # Usage
//!
//! ```bash
//! si-cli dashboard --period 90d
//! si-cli sync --yes
//! ```

use rust_decimal::Decimal;
use store_insights_client::{
    DashboardOrchestrator, DashboardSnapshot, DashboardState, InsightsBackend, SessionGate,
};
use store_insights_core::{RevenuePeriod, TenantProfile};

use super::CommandError;
use super::prompt::confirm;

/// Fetch and render the dashboard for `period`.
///
/// A failed fetch is rendered (error line plus any data still on screen)
/// before the error is returned.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` without a session and
/// `CommandError::Dashboard` if any dashboard query fails.
pub async fn show<B: InsightsBackend>(
    gate: &SessionGate<B>,
    dashboard: &DashboardOrchestrator<B>,
    period: RevenuePeriod,
) -> Result<(), CommandError> {
    let tenant = gate.current_tenant().ok_or(CommandError::NotSignedIn)?;

    let outcome = dashboard.load_snapshot(period).await;
    print_block(&render(&dashboard.state(), Some(&tenant)));
    outcome?;
    Ok(())
}

/// Confirm, sync from Shopify, then render the refreshed dashboard.
///
/// # Errors
///
/// Returns `CommandError::NotSignedIn` without a session and
/// `CommandError::Dashboard` if the sync fails.
pub async fn sync<B: InsightsBackend>(
    gate: &SessionGate<B>,
    dashboard: &DashboardOrchestrator<B>,
    yes: bool,
) -> Result<(), CommandError> {
    let tenant = gate.current_tenant().ok_or(CommandError::NotSignedIn)?;
    if !confirm("This will sync all data from Shopify. Continue?", yes, "sync")? {
        print_block("Aborted.");
        return Ok(());
    }

    let result = dashboard.sync().await?;
    print_block(&result.summary());
    print_block(&render(&dashboard.state(), Some(&tenant)));
    Ok(())
}

/// Render the dashboard state as plain text.
#[must_use]
pub fn render(state: &DashboardState, tenant: Option<&TenantProfile>) -> String {
    let mut lines = vec![match tenant {
        Some(tenant) => format!("Store Insights | {tenant}"),
        None => "Store Insights".to_string(),
    }];

    if let Some(error) = &state.error {
        lines.push(format!("Error: {error}"));
    }
    if state.is_initial_load() {
        lines.push("Loading...".to_string());
    }
    if let Some(snapshot) = &state.snapshot {
        lines.extend(render_snapshot(snapshot));
    }

    lines.join("\n")
}

fn render_snapshot(snapshot: &DashboardSnapshot) -> Vec<String> {
    let overview = &snapshot.overview;
    let mut lines = vec![
        String::new(),
        "Overview".to_string(),
        format!("  Total customers      {}", overview.total_customers),
        format!("  Total orders         {}", overview.total_orders),
        format!("  Total revenue        {}", money(overview.total_revenue)),
        format!("  Average order value  {}", money(overview.avg_order_value)),
        String::new(),
        format!("Revenue trend ({})", snapshot.revenue_period.label()),
    ];
    if snapshot.revenue_trend.is_empty() {
        lines.push("  No revenue in this period".to_string());
    }
    lines.extend(
        snapshot
            .revenue_trend
            .iter()
            .map(|point| format!("  {}  {}", point.date, money(point.revenue))),
    );

    lines.push(String::new());
    lines.push("Orders by date".to_string());
    if snapshot.orders_by_date.is_empty() {
        lines.push("  No orders".to_string());
    }
    lines.extend(snapshot.orders_by_date.iter().map(|point| {
        format!(
            "  {}  {:>5}  {}",
            point.date,
            point.order_count,
            money(point.revenue)
        )
    }));

    lines.push(String::new());
    lines.push("Top customers".to_string());
    if snapshot.top_customers.is_empty() {
        lines.push("  No customers yet".to_string());
    }
    for (rank, customer) in snapshot.ranked_customers() {
        let email = customer
            .secondary_email()
            .map(|email| format!(" <{email}>"))
            .unwrap_or_default();
        lines.push(format!(
            "  {rank}. {}{email}  {}  ({})",
            customer.display_name(),
            money(customer.total_spent),
            customer.orders_label()
        ));
    }

    lines
}

fn money(value: Decimal) -> String {
    format!("${:.2}", value.round_dp(2))
}

#[allow(clippy::print_stdout)]
fn print_block(text: &str) {
    println!("{text}");
}
