//! HTTP route handlers for the Torwaechter API.
//!
//! - `health`: Health check, metrics and version endpoints
//! - `controller`: Demo tenant-scoped controller endpoints behind the gate

pub mod controller;
pub mod health;

use axum::middleware::from_fn_with_state;
use axum::{routing::get, Router};

use crate::middleware;
use crate::state::AppState;

/// Assembles the gated application router. Transport-level layers (tracing,
/// body limits, security headers) are added by the caller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/metrics", get(health::metrics))
        .route("/version", get(health::version))
        .route("/{tenant}/controller/v1/{controller_id}", get(controller::poll))
        .route("/{tenant}/controller/artifacts/{filename}", get(controller::download_artifact))
        .layer(from_fn_with_state(state.clone(), middleware::gate::gate_middleware))
        .with_state(state)
}
