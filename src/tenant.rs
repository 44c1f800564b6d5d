//! Tenant-scoped configuration resolution.
//!
//! Every lookup takes the tenant as an explicit parameter; there is no
//! ambient tenant state. The trait is object-safe so the application state
//! can carry alternative backends (the bundled one is file-backed).

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Keys resolvable per tenant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TenantConfigKey {
    /// The trusted certificate-issuer hash for header pre-authentication.
    AuthorityName,
}

impl TenantConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantConfigKey::AuthorityName => "authentication.header.authority_name",
        }
    }
}

/// A lookup failure, as opposed to "no value configured".
///
/// The two must stay distinguishable: an unavailable backend propagates as an
/// error while a tenant without a configured value is a normal `Ok(None)`.
#[derive(Debug, Error)]
pub enum TenantConfigError {
    #[error("tenant configuration unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TenantConfigSource: Send + Sync {
    /// Resolves a configuration value for the given tenant. `Ok(None)` means
    /// the tenant has no value configured for the key.
    async fn resolve(
        &self,
        tenant: &str,
        key: TenantConfigKey,
    ) -> Result<Option<String>, TenantConfigError>;
}

/// In-process source backed by the `[auth.tenants]` table of the config file.
pub struct StaticTenantConfig {
    tenants: HashMap<String, String>,
}

impl StaticTenantConfig {
    pub fn new(tenants: HashMap<String, String>) -> Self {
        Self { tenants }
    }
}

#[async_trait]
impl TenantConfigSource for StaticTenantConfig {
    async fn resolve(
        &self,
        tenant: &str,
        key: TenantConfigKey,
    ) -> Result<Option<String>, TenantConfigError> {
        match key {
            TenantConfigKey::AuthorityName => Ok(self.tenants.get(tenant).cloned()),
        }
    }
}
