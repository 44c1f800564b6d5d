//! The request gate: address checks and rate accounting first, then header
//! pre-authentication for admitted, non-whitelisted, tenant-scoped requests.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::{AppError, AppResult};
use crate::middleware::ip::{extract_client_address, MaybeRemoteAddr};
use crate::middleware::rate_limit::{GateDecision, RejectReason, TrafficClass};
use crate::state::AppState;
use crate::token::{parse_target, PreAuthContext, SecurityToken};

/// Axum middleware composing the DoS guard and the header pre-authenticator.
///
/// Whitelisted clients pass straight through without identity derivation.
/// For every other admitted request with a tenant scope in its path, the
/// derived [`PreAuthContext`] is attached as a request extension.
pub async fn gate_middleware(
    State(state): State<AppState>,
    MaybeRemoteAddr(remote): MaybeRemoteAddr,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    state.metrics.inc_requests_total();

    let address = extract_client_address(req.headers(), &state.config.dos.forward_header, remote)
        .unwrap_or_default();
    let class = TrafficClass::from_method(req.method());

    let whitelisted = match state.guard.evaluate(&address, class) {
        GateDecision::Reject(RejectReason::MissingAddress) => {
            state.metrics.inc_rejected_missing_address();
            return Err(AppError::MissingClientAddress);
        }
        GateDecision::Reject(RejectReason::Blacklisted) => {
            state.metrics.inc_rejected_blacklist();
            return Err(AppError::Blacklisted);
        }
        GateDecision::Reject(RejectReason::RateExceeded { .. }) => {
            state.metrics.inc_rejected_rate_limit();
            return Err(AppError::RateLimited { retry_after_seconds: 1 });
        }
        GateDecision::Admit { whitelisted } => whitelisted,
    };

    if whitelisted {
        state.metrics.inc_requests_whitelisted();
        state.metrics.inc_requests_admitted();
        return Ok(next.run(req).await);
    }

    if let Some(target) = parse_target(req.uri().path()) {
        let context = {
            let token =
                SecurityToken::new(&target.tenant, target.controller_id.as_deref(), req.headers());
            let principal = state
                .preauth
                .derive_principal(&token, state.tenant_config.as_ref())
                .await?;
            let expected = state
                .preauth
                .derive_credential(&token, state.tenant_config.as_ref())
                .await?;
            PreAuthContext { principal, expected }
        };

        if context.principal.is_some() {
            state.metrics.inc_auth_derived();
        } else {
            state.metrics.inc_auth_anonymous();
        }
        req.extensions_mut().insert(context);
    }

    state.metrics.inc_requests_admitted();
    Ok(next.run(req).await)
}
