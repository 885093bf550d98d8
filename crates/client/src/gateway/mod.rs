//! Insights backend gateway.
//!
//! The gateway is the only layer that knows the backend is HTTP. Everything
//! above it (session gate, dashboard orchestrator) works against the
//! [`InsightsBackend`] contract and a uniform [`GatewayError`].
//!
//! # Architecture
//!
//! - [`HttpGateway`] issues JSON requests with `reqwest`
//! - Authenticated requests attach the bearer token from the
//!   [`SessionStore`](crate::session::SessionStore)
//! - Non-2xx responses become [`GatewayError::Api`] with the backend's
//!   `error` / `errors` fields preserved verbatim
//! - No retries: callers re-invoke explicitly

pub mod http;

pub use http::HttpGateway;

use std::future::Future;

use serde::Deserialize;
use store_insights_core::{
    CustomerRanking, DateRange, OrderPoint, OverviewMetrics, RevenuePeriod, RevenuePoint,
    SyncResult, TenantProfile,
};
use thiserror::Error;

use crate::session::{Credentials, Registration};

/// Errors that can occur when talking to the insights backend.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The request never produced an HTTP response (connection, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("API error: {status}{}", format_api_detail(.message.as_deref(), .errors))]
    Api {
        status: u16,
        /// The `error` field of the response body, if any.
        message: Option<String>,
        /// The `errors` array of the response body, if any.
        errors: Vec<String>,
    },

    /// The response body did not match the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),

    /// An authenticated request was attempted without an active session.
    #[error("No active session - login required")]
    NoSession,

    /// An endpoint URL could not be built from the configured base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl GatewayError {
    /// Whether the backend rejected the request itself (4xx).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }

    /// Backend-provided messages, preferring `error` over `errors`.
    #[must_use]
    pub fn remote_messages(&self) -> Vec<String> {
        match self {
            Self::Api { message: Some(message), .. } => vec![message.clone()],
            Self::Api { errors, .. } => errors.clone(),
            _ => Vec::new(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

fn format_api_detail(message: Option<&str>, errors: &[String]) -> String {
    match message {
        Some(message) => format!(" - {message}"),
        None if !errors.is_empty() => format!(" - {}", errors.join(", ")),
        None => String::new(),
    }
}

/// Error body shape shared by all backend endpoints.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Response of the login and registration endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub tenant: Option<TenantProfile>,
}

/// Contract of the remote insights service.
///
/// Implementations are cheap handles (clone = shared connection pool), so
/// the gate and the orchestrator can each hold one.
pub trait InsightsBackend: Send + Sync {
    /// `POST /auth/register`
    fn register(
        &self,
        registration: &Registration,
    ) -> impl Future<Output = Result<AuthPayload, GatewayError>> + Send;

    /// `POST /auth/login`
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<AuthPayload, GatewayError>> + Send;

    /// `GET /insights/overview`
    fn overview(&self) -> impl Future<Output = Result<OverviewMetrics, GatewayError>> + Send;

    /// `GET /insights/revenue-trend?period=`
    fn revenue_trend(
        &self,
        period: RevenuePeriod,
    ) -> impl Future<Output = Result<Vec<RevenuePoint>, GatewayError>> + Send;

    /// `GET /insights/orders-by-date?startDate=&endDate=`
    fn orders_by_date(
        &self,
        range: DateRange,
    ) -> impl Future<Output = Result<Vec<OrderPoint>, GatewayError>> + Send;

    /// `GET /insights/top-customers?limit=`
    fn top_customers(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<CustomerRanking>, GatewayError>> + Send;

    /// `POST /shopify/sync`
    fn sync(&self) -> impl Future<Output = Result<SyncResult, GatewayError>> + Send;
}
