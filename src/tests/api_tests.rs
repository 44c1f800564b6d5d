use std::collections::HashMap;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt; // for .collect()
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use crate::config::{AppConfig, AuthConfig, DosConfig, ServerConfig};
use crate::routes;
use crate::state::AppState;
use crate::tenant::{TenantConfigError, TenantConfigKey, TenantConfigSource};

fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 8080 },
        dos: DosConfig {
            max_read_per_second: Some(100),
            max_write_per_second: Some(100),
            blacklist_pattern: None,
            whitelist_pattern: None,
            forward_header: "X-Forwarded-For".to_string(),
        },
        auth: AuthConfig {
            common_name_header: "X-Ssl-Client-Cn".to_string(),
            issuer_hash_header_template: "X-Ssl-Issuer-Hash-{}".to_string(),
            max_chain_depth: 100,
            tenants: HashMap::from([(
                "acme".to_string(),
                "ae:11:f5:6a".to_string(),
            )]),
        },
    }
}

fn setup_app(config: AppConfig) -> axum::Router {
    routes::router(AppState::new(config).unwrap())
}

async fn body_json(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Forwarded-For", "203.0.113.5")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn healthz_passes_the_gate() {
    let app = setup_app(test_config());
    let res = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn request_without_any_address_source_is_an_internal_error() {
    let app = setup_app(test_config());
    // No ConnectInfo and no forwarding header.
    let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(res).await;
    assert_eq!(body["error"]["code"], "MISSING_CLIENT_ADDRESS");
}

#[tokio::test]
async fn unknown_forwarded_address_is_an_internal_error() {
    let app = setup_app(test_config());
    let req = Request::builder()
        .uri("/healthz")
        .header("X-Forwarded-For", "Unknown")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn blacklisted_client_is_rejected_even_when_whitelisted() {
    let mut config = test_config();
    config.dos.blacklist_pattern = Some("^203\\.0\\.113\\.".to_string());
    config.dos.whitelist_pattern = Some("^203\\.".to_string());
    let app = setup_app(config);
    let res = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body = body_json(res).await;
    assert_eq!(body["error"]["code"], "BLACKLISTED");
}

#[tokio::test]
async fn read_threshold_yields_too_many_requests() {
    let mut config = test_config();
    config.dos.max_read_per_second = Some(1);
    let app = setup_app(config);

    // Creation request plus two counted requests stay under the threshold.
    for _ in 0..3 {
        let res = app.clone().oneshot(get("/healthz")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(res).await;
    assert_eq!(body["error"]["code"], "RATE_LIMITED");
    assert_eq!(body["error"]["details"]["retry_after_seconds"], 1);
}

#[tokio::test]
async fn whitelisted_client_bypasses_rate_limiting() {
    let mut config = test_config();
    config.dos.max_read_per_second = Some(1);
    config.dos.whitelist_pattern = Some("^203\\.0\\.113\\.5$".to_string());
    let app = setup_app(config);
    for _ in 0..20 {
        let res = app.clone().oneshot(get("/healthz")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn controller_poll_with_matching_certificate_headers_is_authenticated() {
    let app = setup_app(test_config());
    let req = Request::builder()
        .uri("/acme/controller/v1/dev-42")
        .header("X-Forwarded-For", "203.0.113.5")
        .header("X-Ssl-Client-Cn", "dev-42")
        .header("X-Ssl-Issuer-Hash-1", "7f:87:cb:b5")
        .header("X-Ssl-Issuer-Hash-2", "ae:11:f5:6a")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["principal"], "dev-42");
}

#[tokio::test]
async fn controller_poll_without_certificate_headers_is_anonymous() {
    let app = setup_app(test_config());
    let res = app.oneshot(get("/acme/controller/v1/dev-42")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["principal"], Value::Null);
}

#[tokio::test]
async fn legacy_artifact_download_falls_back_to_common_name() {
    let app = setup_app(test_config());
    let req = Request::builder()
        .uri("/acme/controller/artifacts/fw-1.2.bin")
        .header("X-Forwarded-For", "203.0.113.5")
        .header("X-Ssl-Client-Cn", "dev-42")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["principal"], "dev-42");
    assert_eq!(body["authenticated"], false);
}

struct FailingTenantConfig;

#[async_trait]
impl TenantConfigSource for FailingTenantConfig {
    async fn resolve(
        &self,
        _tenant: &str,
        _key: TenantConfigKey,
    ) -> Result<Option<String>, TenantConfigError> {
        Err(TenantConfigError::Unavailable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn tenant_config_outage_is_not_reported_as_unauthenticated() {
    let mut state = AppState::new(test_config()).unwrap();
    state.tenant_config = Arc::new(FailingTenantConfig);
    let app = routes::router(state);
    let res = app.oneshot(get("/acme/controller/v1/dev-42")).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(res).await;
    assert_eq!(body["error"]["code"], "TENANT_CONFIG_ERROR");
}

#[tokio::test]
async fn whitelisted_requests_count_as_admitted() {
    let mut config = test_config();
    config.dos.whitelist_pattern = Some("^203\\.0\\.113\\.5$".to_string());
    let state = AppState::new(config).unwrap();
    let app = routes::router(state.clone());

    let res = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let snapshot = state.metrics.get_snapshot();
    assert_eq!(snapshot.requests_total, 1);
    assert_eq!(snapshot.requests_whitelisted, 1);
    assert_eq!(snapshot.requests_admitted, 1);
}

#[tokio::test]
async fn metrics_snapshot_counts_rejections() {
    let mut config = test_config();
    config.dos.blacklist_pattern = Some("^198\\.51\\.100\\.".to_string());
    let state = AppState::new(config).unwrap();
    let app = routes::router(state.clone());

    let req = Request::builder()
        .uri("/healthz")
        .header("X-Forwarded-For", "198.51.100.9")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["rejected_blacklist"], 1);
    assert_eq!(body["requests_total"], 2);
}
