use std::sync::Arc;

use crate::config::AppConfig;
use crate::metrics::Metrics;
use crate::middleware::{DosGuard, HeaderPreAuth};
use crate::tenant::{StaticTenantConfig, TenantConfigSource};

/// The shared application state.
///
/// Holds the immutable configuration, the admission components and the
/// metrics counters. Cloneable for use with Axum's request extraction
/// system; all contained state is safe under concurrent access.
#[derive(Clone)]
pub struct AppState {
    /// The application configuration, immutable for the process lifetime.
    pub config: Arc<AppConfig>,
    /// Admission and authentication counters.
    pub metrics: Metrics,
    /// The DoS guard with its per-client counter tables.
    pub guard: Arc<DosGuard>,
    /// The header pre-authenticator.
    pub preauth: Arc<HeaderPreAuth>,
    /// Tenant-scoped configuration resolution; swappable for other backends.
    pub tenant_config: Arc<dyn TenantConfigSource>,
}

impl AppState {
    /// Creates the application state from a validated configuration.
    ///
    /// Address-list patterns are compiled here; an invalid pattern that
    /// slipped past config validation still fails fast at startup.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        let guard = DosGuard::new(&config.dos)?;
        let preauth = HeaderPreAuth::new(&config.auth);
        let tenant_config = StaticTenantConfig::new(config.auth.tenants.clone());

        Ok(Self {
            config: Arc::new(config),
            metrics: Metrics::new(),
            guard: Arc::new(guard),
            preauth: Arc::new(preauth),
            tenant_config: Arc::new(tenant_config),
        })
    }
}
