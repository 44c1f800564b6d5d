use axum::{
    extract::{connect_info::ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use std::convert::Infallible;
use std::net::SocketAddr;

/// Extract the client address string from the configured forwarding header
/// with the transport peer address as fallback.
///
/// Only string host extraction happens here: the first comma-separated entry
/// of the forwarding header is taken as-is, without validating it as an IP
/// address. `None` means no address source was available at all; empty or
/// `"unknown"` values are passed through and classified by the guard.
pub fn extract_client_address(
    headers: &HeaderMap,
    forward_header: &str,
    fallback: Option<SocketAddr>,
) -> Option<String> {
    if let Some(value) = headers.get(forward_header).and_then(|hv| hv.to_str().ok()) {
        if let Some(first) = value.split(',').next() {
            return Some(first.trim().to_string());
        }
    }
    fallback.map(|addr| addr.ip().to_string())
}

/// Optional extractor for remote socket address. Unlike `ConnectInfo`, this never rejects
/// if the connection info extension is absent (e.g. in tests or custom services).
#[derive(Clone, Copy, Debug, Default)]
pub struct MaybeRemoteAddr(pub Option<SocketAddr>);

impl<S> FromRequestParts<S> for MaybeRemoteAddr
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match ConnectInfo::<SocketAddr>::from_request_parts(parts, state).await {
            Ok(ConnectInfo(addr)) => Ok(MaybeRemoteAddr(Some(addr))),
            Err(_) => Ok(MaybeRemoteAddr(None)),
        }
    }
}
