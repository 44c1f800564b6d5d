use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::error::Error;
use std::fmt;

use crate::tenant::TenantConfigError;

/// The primary error type for the application.
///
/// This enum consolidates all failures the admission layer can surface,
/// providing a unified way to render them as HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// For internal server errors that are not expected to be handled by the client.
    Internal(anyhow::Error),
    /// The client address could not be determined. This is an infrastructure
    /// fault (address extraction failed upstream), not a client violation.
    MissingClientAddress,
    /// The client address matched the configured blacklist pattern.
    Blacklisted,
    /// For when a client has sent too many requests in a given amount of time.
    RateLimited {
        /// The number of seconds to wait before retrying the request.
        retry_after_seconds: u64,
    },
    /// The tenant configuration lookup failed. Kept distinct from "no
    /// authentication derived" so a backend outage never masquerades as a
    /// security rejection.
    TenantConfig(TenantConfigError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(e) => write!(f, "Internal error: {}", e),
            AppError::MissingClientAddress => write!(f, "Unable to determine client address"),
            AppError::Blacklisted => write!(f, "Client address is blacklisted"),
            AppError::RateLimited { retry_after_seconds } => {
                write!(f, "Rate limited. Retry after {} seconds", retry_after_seconds)
            }
            AppError::TenantConfig(e) => write!(f, "Tenant configuration lookup failed: {}", e),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AppError::Internal(e) => Some(e.as_ref()),
            AppError::TenantConfig(e) => Some(e),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, error_message, details) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                let error_id = uuid::Uuid::new_v4();
                tracing::error!("Error ID: {}", error_id);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    Some(json!({ "error_id": error_id.to_string() })),
                )
            }
            AppError::MissingClientAddress => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MISSING_CLIENT_ADDRESS",
                "Unable to determine client address".to_string(),
                None,
            ),
            AppError::Blacklisted => {
                (StatusCode::FORBIDDEN, "BLACKLISTED", "Access denied".to_string(), None)
            }
            AppError::RateLimited { retry_after_seconds } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Too many requests. Please retry after {} seconds", retry_after_seconds),
                Some(json!({ "retry_after_seconds": retry_after_seconds })),
            ),
            AppError::TenantConfig(e) => {
                tracing::error!("Tenant configuration lookup failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "TENANT_CONFIG_ERROR",
                    "Tenant configuration lookup failed".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": error_message,
            },
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let Some(details) = details {
            body["error"]["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<TenantConfigError> for AppError {
    fn from(err: TenantConfigError) -> Self {
        AppError::TenantConfig(err)
    }
}

/// A type alias for `Result<T, AppError>`, used throughout the application.
pub type AppResult<T> = Result<T, AppError>;
