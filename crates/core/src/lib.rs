//! Store Insights Core - Shared data types.
//!
//! This crate provides the plain data structures exchanged between the
//! dashboard core and its collaborators:
//! - `client` - Session gate, backend gateway and dashboard orchestrator
//! - `cli` - Command-line front end that renders dashboard snapshots
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients, no storage. Renderers can depend on it without pulling in the
//! network stack.
//!
//! # Modules
//!
//! - [`types`] - Tenant profile, metrics, series points, rankings and periods

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
