//! `reqwest` implementation of the insights backend contract.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use secrecy::ExposeSecret;
use serde::{Serialize, de::DeserializeOwned};
use store_insights_core::{
    CustomerRanking, DateRange, OrderPoint, OverviewMetrics, RevenuePeriod, RevenuePoint,
    SyncResult,
};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{AuthPayload, ErrorBody, GatewayError, InsightsBackend};
use crate::config::ClientConfig;
use crate::session::{Credentials, Registration, SessionStore};

/// HTTP gateway to the insights backend.
///
/// Cloning is cheap and shares the connection pool and session store.
#[derive(Clone)]
pub struct HttpGateway {
    inner: Arc<HttpGatewayInner>,
}

struct HttpGatewayInner {
    client: reqwest::Client,
    /// Base URL, always ending in `/`
    base_url: Url,
    /// Source of the bearer token for authenticated requests
    store: SessionStore,
}

/// Request body for `POST /auth/login`.
#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Request body for `POST /auth/register`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    shop_domain: &'a str,
    access_token: &'a str,
}

impl HttpGateway {
    /// Create a new gateway for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the HTTP client fails to build.
    pub fn new(config: &ClientConfig, store: SessionStore) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.http_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            inner: Arc::new(HttpGatewayInner {
                client,
                base_url: config.api_url.clone(),
                store,
            }),
        })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, GatewayError> {
        let mut url = self
            .inner
            .base_url
            .join(path)
            .map_err(|e| GatewayError::InvalidUrl(format!("{path}: {e}")))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Build a request carrying the stored bearer token.
    fn authenticated(&self, method: Method, url: Url) -> Result<RequestBuilder, GatewayError> {
        let token = self.inner.store.token().ok_or(GatewayError::NoSession)?;
        Ok(self
            .inner
            .client
            .request(method, url)
            .bearer_auth(token.expose_secret()))
    }

    async fn get_authenticated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = self.endpoint(path, query)?;
        let request = self.authenticated(Method::GET, url)?;
        execute(request).await
    }

    async fn post_anonymous<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let url = self.endpoint(path, &[])?;
        execute(self.inner.client.post(url).json(body)).await
    }
}

/// Send a request and decode a 2xx JSON body, mapping failures uniformly.
async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, GatewayError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        let body = response.bytes().await?;
        return serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
    let message = body.error.or(body.message);

    if status.is_server_error() {
        warn!(status = status.as_u16(), "Insights backend returned a server error");
    } else {
        debug!(status = status.as_u16(), "Insights backend rejected request");
    }

    Err(GatewayError::Api {
        status: status.as_u16(),
        message,
        errors: body.errors,
    })
}

impl InsightsBackend for HttpGateway {
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    async fn register(&self, registration: &Registration) -> Result<AuthPayload, GatewayError> {
        let body = RegisterRequest {
            email: &registration.email,
            password: registration.password.expose_secret(),
            shop_domain: &registration.shop_domain,
            access_token: registration.access_token.expose_secret(),
        };
        self.post_anonymous("auth/register", &body).await
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn login(&self, credentials: &Credentials) -> Result<AuthPayload, GatewayError> {
        let body = LoginRequest {
            email: &credentials.email,
            password: credentials.password.expose_secret(),
        };
        self.post_anonymous("auth/login", &body).await
    }

    #[instrument(skip(self))]
    async fn overview(&self) -> Result<OverviewMetrics, GatewayError> {
        self.get_authenticated("insights/overview", &[]).await
    }

    #[instrument(skip(self), fields(period = %period))]
    async fn revenue_trend(&self, period: RevenuePeriod) -> Result<Vec<RevenuePoint>, GatewayError> {
        self.get_authenticated("insights/revenue-trend", &[("period", period.to_string())])
            .await
    }

    #[instrument(skip(self), fields(range = %range))]
    async fn orders_by_date(&self, range: DateRange) -> Result<Vec<OrderPoint>, GatewayError> {
        self.get_authenticated("insights/orders-by-date", &range.query_pairs())
            .await
    }

    #[instrument(skip(self))]
    async fn top_customers(&self, limit: u32) -> Result<Vec<CustomerRanking>, GatewayError> {
        self.get_authenticated("insights/top-customers", &[("limit", limit.to_string())])
            .await
    }

    #[instrument(skip(self))]
    async fn sync(&self) -> Result<SyncResult, GatewayError> {
        let url = self.endpoint("shopify/sync", &[])?;
        let request = self.authenticated(Method::POST, url)?;
        execute(request).await
    }
}
