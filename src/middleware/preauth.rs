//! Header-based pre-authentication for device requests.
//!
//! A TLS-terminating reverse proxy injects the certificate common name and
//! an ordinally numbered family of issuer-hash headers, e.g.
//!
//! ```text
//! X-Ssl-Client-Cn: dev-42
//! X-Ssl-Issuer-Hash-1: ae:11:f5:6a:0a:e8:74:50:81:0e:0c:37:ec:c5:22:fc
//! X-Ssl-Issuer-Hash-2: 7f:87:cb:b5:9c:e0:c5:0a:1a:a6:57:69:0f:ca:0a:95
//! ```
//!
//! A request is considered pre-authenticated when any hash in the chain
//! equals the tenant's configured authority value. Hash values never appear
//! in log output.

use crate::config::AuthConfig;
use crate::tenant::{TenantConfigError, TenantConfigKey, TenantConfigSource};
use crate::token::{HeaderAuthentication, SecurityToken};

pub struct HeaderPreAuth {
    common_name_header: String,
    issuer_hash_header_template: String,
    max_chain_depth: u32,
}

impl HeaderPreAuth {
    pub fn new(cfg: &AuthConfig) -> Self {
        Self {
            common_name_header: cfg.common_name_header.clone(),
            issuer_hash_header_template: cfg.issuer_hash_header_template.clone(),
            max_chain_depth: cfg.max_chain_depth,
        }
    }

    fn issuer_hash_header(&self, index: u32) -> String {
        self.issuer_hash_header_template.replace("{}", &index.to_string())
    }

    /// Derives the trusted (principal, credential) pair for this request.
    ///
    /// Returns `Ok(None)` when no pair can be derived - an expected outcome
    /// for anonymous traffic, never an error. A failing tenant configuration
    /// lookup propagates as `Err` so a backend outage is not mistaken for an
    /// unauthenticated client.
    pub async fn derive_principal(
        &self,
        token: &SecurityToken<'_>,
        tenant_config: &dyn TenantConfigSource,
    ) -> Result<Option<HeaderAuthentication>, TenantConfigError> {
        let common_name = token.header(&self.common_name_header);
        let expected = tenant_config
            .resolve(token.tenant(), TenantConfigKey::AuthorityName)
            .await?;

        let matched = match expected.as_deref() {
            Some(expected) => self.find_issuer_hash(token, expected),
            None => None,
        };

        if let (Some(common_name), Some(hash)) = (common_name, matched) {
            tracing::trace!(
                target: "security.auth",
                tenant = token.tenant(),
                common_name,
                "Found matching issuer hash ****, using as credentials"
            );
            return Ok(Some(HeaderAuthentication {
                principal: common_name.to_string(),
                credential: hash.to_string(),
            }));
        }

        tracing::debug!(
            target: "security.auth",
            config_key = TenantConfigKey::AuthorityName.as_str(),
            header_template = %self.issuer_hash_header_template,
            common_name = ?common_name,
            "Certificate request but no matching issuer hash found in headers"
        );
        Ok(None)
    }

    /// Scans `issuer-hash-1`, `issuer-hash-2`, ... for the first value equal
    /// to the known hash. The first absent index terminates the chain; the
    /// scan is additionally capped at `max_chain_depth` so a client cannot
    /// force an unbounded probe by never leaving a gap.
    fn find_issuer_hash<'a>(
        &self,
        token: &SecurityToken<'a>,
        expected: &str,
    ) -> Option<&'a str> {
        for index in 1..=self.max_chain_depth {
            match token.header(&self.issuer_hash_header(index)) {
                None => return None,
                Some(value) if value == expected => {
                    tracing::trace!(
                        target: "security.auth",
                        position = index,
                        "Found matching issuer hash at chain position"
                    );
                    return Some(value);
                }
                Some(_) => {}
            }
        }
        tracing::debug!(
            target: "security.auth",
            max_chain_depth = self.max_chain_depth,
            "Issuer hash chain scan aborted at configured depth limit"
        );
        None
    }

    /// Supplies the credential-side view for the downstream comparison step:
    /// the effective controller id paired with the tenant's authority value.
    ///
    /// The controller id parsed from the path wins unless it is absent or the
    /// `anonymous` sentinel; legacy artifact downloads carry no controller id
    /// in the path, so the common-name header is the only identifier left.
    pub async fn derive_credential(
        &self,
        token: &SecurityToken<'_>,
        tenant_config: &dyn TenantConfigSource,
    ) -> Result<HeaderAuthentication, TenantConfigError> {
        let authority = tenant_config
            .resolve(token.tenant(), TenantConfigKey::AuthorityName)
            .await?
            .unwrap_or_default();

        let controller_id = token
            .controller_id()
            .filter(|id| *id != "anonymous")
            .or_else(|| token.header(&self.common_name_header));

        Ok(HeaderAuthentication {
            principal: controller_id.unwrap_or_default().to_string(),
            credential: authority,
        })
    }
}
