//! Demo controller endpoints standing in for the device-management backend.
//!
//! They echo the pre-authentication context the gate attached to the
//! request; the real backend consumes the same extension.

use axum::{extract::Path, http::StatusCode, response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::token::PreAuthContext;

/// `GET /{tenant}/controller/v1/{controller_id}` - device poll.
pub async fn poll(
    Path((tenant, controller_id)): Path<(String, String)>,
    context: Option<Extension<PreAuthContext>>,
) -> impl IntoResponse {
    let context = context.map(|Extension(c)| c);
    let body = json!({
        "tenant": tenant,
        "controller_id": controller_id,
        "principal": context.as_ref().and_then(|c| c.principal.as_ref().map(|p| p.principal.clone())),
        "authenticated": context.as_ref().map(|c| c.principal.is_some()).unwrap_or(false),
    });
    (StatusCode::OK, Json(body))
}

/// `GET /{tenant}/controller/artifacts/{filename}` - legacy artifact
/// download; no controller id in the path.
pub async fn download_artifact(
    Path((tenant, filename)): Path<(String, String)>,
    context: Option<Extension<PreAuthContext>>,
) -> impl IntoResponse {
    let context = context.map(|Extension(c)| c);
    let body = json!({
        "tenant": tenant,
        "artifact": filename,
        // For the legacy shape the effective identity falls back to the
        // certificate common name.
        "principal": context.as_ref().map(|c| c.expected.principal.clone()),
        "authenticated": context.as_ref().map(|c| c.principal.is_some()).unwrap_or(false),
    });
    (StatusCode::OK, Json(body))
}
