//! Store Insights Client - Session gate and dashboard orchestration.
//!
//! This crate is the stateful core of the Store Insights dashboard. It talks
//! to the multi-tenant insights backend on behalf of a single signed-in
//! tenant and produces plain data for renderers.
//!
//! # Architecture
//!
//! - [`session::SessionStore`] - Durable credential + tenant profile
//! - [`gateway::InsightsBackend`] - Contract of the remote service, with
//!   [`gateway::HttpGateway`] as the `reqwest` implementation
//! - [`session::SessionGate`] - Login, registration, logout, route guard
//! - [`dashboard::DashboardOrchestrator`] - Concurrent snapshot loading,
//!   period changes and the guarded Shopify sync
//!
//! Everything runs on the caller's task: fan-out uses `tokio::join!` and no
//! tasks are spawned, so a current-thread runtime is enough.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod dashboard;
pub mod gateway;
pub mod session;

pub use config::{ClientConfig, ConfigError};
pub use dashboard::{
    DashboardError, DashboardOptions, DashboardOrchestrator, DashboardSnapshot, DashboardState,
    LoadOutcome,
};
pub use gateway::{AuthPayload, GatewayError, HttpGateway, InsightsBackend};
pub use session::{
    AuthError, AuthState, Credentials, FileStorage, MemoryStorage, Registration, Session,
    SessionGate, SessionStorage, SessionStore, StoreError,
};
