use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

// Health check endpoint - lightweight, still passes the gate
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

// Metrics endpoint: returns JSON snapshot
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.metrics.get_snapshot();
    Json(snapshot)
}

// Version/Build info endpoint (JSON)
pub async fn version() -> impl IntoResponse {
    let body = serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "package": {
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authors": env!("CARGO_PKG_AUTHORS"),
            "license": env!("CARGO_PKG_LICENSE"),
        },
        "build": {
            "profile": if cfg!(debug_assertions) { "debug" } else { "release" },
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        }
    });
    (StatusCode::OK, Json(body))
}
