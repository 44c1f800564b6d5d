//! # Torwaechter
//!
//! Request-admission and identity-extraction gateway in front of a
//! multi-tenant device-management backend.
//!
//! ## Architecture
//!
//! The application is built using:
//! - **Axum**: Modern web framework for HTTP server and routing
//! - **Tokio**: Async runtime for concurrent request processing
//! - **DashMap**: Lock-free concurrent counter tables for rate accounting
//! - **Tracing**: Structured logging with dedicated security channels
//!
//! ## Core Components
//!
//! - [`config`]: Application configuration management
//! - [`error`]: Centralized error handling and HTTP error responses
//! - [`metrics`]: Admission and authentication counters
//! - [`middleware`]: DoS guard, header pre-authentication and the gate
//! - [`routes`]: HTTP API endpoint handlers
//! - [`state`]: Shared application state
//! - [`tenant`]: Tenant-scoped configuration resolution
//! - [`token`]: Per-request security token and derived identity types
//!
//! ## Request Flow
//!
//! Every request passes the gate: client-address extraction (honoring the
//! configured forwarding header), blacklist/whitelist checks, per-client
//! read/write rate accounting with a one-second sliding window, and - for
//! admitted tenant-scoped requests - derivation of a (principal, credential)
//! pair from reverse-proxy-injected mTLS certificate headers.

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod tenant;
pub mod token;

#[cfg(test)]
mod tests;
