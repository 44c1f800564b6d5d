use axum::http::HeaderMap;
use serde::Serialize;

/// A derived (principal, credential) pair.
///
/// Both fields are always populated when a pair is returned from principal
/// derivation; "no authentication" is expressed as absence, never as a pair
/// with an empty principal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HeaderAuthentication {
    pub principal: String,
    pub credential: String,
}

/// Pre-authentication result attached to admitted tenant-scoped requests as
/// a request extension.
///
/// `principal` is the trusted pair derived from the certificate headers (or
/// `None` for anonymous traffic); `expected` is the credential-side view used
/// by a downstream comparison step.
#[derive(Clone, Debug)]
pub struct PreAuthContext {
    pub principal: Option<HeaderAuthentication>,
    pub expected: HeaderAuthentication,
}

/// Tenant scope and optional controller id parsed from the request path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestTarget {
    pub tenant: String,
    pub controller_id: Option<String>,
}

/// A read-only view of one request's identity-relevant data: the tenant,
/// the optional controller id from the URL path and the request headers.
pub struct SecurityToken<'a> {
    tenant: &'a str,
    controller_id: Option<&'a str>,
    headers: &'a HeaderMap,
}

impl<'a> SecurityToken<'a> {
    pub fn new(tenant: &'a str, controller_id: Option<&'a str>, headers: &'a HeaderMap) -> Self {
        Self { tenant, controller_id, headers }
    }

    pub fn tenant(&self) -> &'a str {
        self.tenant
    }

    pub fn controller_id(&self) -> Option<&'a str> {
        self.controller_id
    }

    /// Looks up a named header. Values that are not valid visible ASCII are
    /// treated as absent.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Parses the tenant scope from a controller request path.
///
/// Recognized shapes:
/// - `/{tenant}/controller/v1/{controller_id}[/...]`
/// - `/{tenant}/controller/artifacts/...` (legacy download, no controller id)
///
/// Any other path has no tenant scope and yields `None`.
pub fn parse_target(path: &str) -> Option<RequestTarget> {
    let mut segments = path.trim_start_matches('/').split('/').filter(|s| !s.is_empty());

    let tenant = segments.next()?;
    if segments.next()? != "controller" {
        return None;
    }
    match segments.next()? {
        "v1" => {
            let controller_id = segments.next()?;
            Some(RequestTarget {
                tenant: tenant.to_string(),
                controller_id: Some(controller_id.to_string()),
            })
        }
        "artifacts" => Some(RequestTarget { tenant: tenant.to_string(), controller_id: None }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_controller_path() {
        let target = parse_target("/acme/controller/v1/dev-42").unwrap();
        assert_eq!(target.tenant, "acme");
        assert_eq!(target.controller_id.as_deref(), Some("dev-42"));
    }

    #[test]
    fn parses_controller_subresource_path() {
        let target = parse_target("/acme/controller/v1/dev-42/deploymentBase/7").unwrap();
        assert_eq!(target.tenant, "acme");
        assert_eq!(target.controller_id.as_deref(), Some("dev-42"));
    }

    #[test]
    fn parses_legacy_artifact_path_without_controller_id() {
        let target = parse_target("/acme/controller/artifacts/fw-1.2.bin").unwrap();
        assert_eq!(target.tenant, "acme");
        assert_eq!(target.controller_id, None);
    }

    #[test]
    fn rejects_unscoped_paths() {
        assert_eq!(parse_target("/healthz"), None);
        assert_eq!(parse_target("/acme/other/v1/dev-42"), None);
        assert_eq!(parse_target("/acme/controller/v2/dev-42"), None);
        assert_eq!(parse_target("/acme/controller/v1"), None);
        assert_eq!(parse_target("/"), None);
    }

    #[test]
    fn header_lookup_ignores_invalid_values() {
        let mut headers = HeaderMap::new();
        headers.insert("x-ssl-client-cn", "dev-42".parse().unwrap());
        let token = SecurityToken::new("acme", None, &headers);
        assert_eq!(token.header("X-Ssl-Client-Cn"), Some("dev-42"));
        assert_eq!(token.header("X-Missing"), None);
    }
}
