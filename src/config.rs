use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DosConfig {
    /// Maximum read (GET) requests per second per client. `None` = unlimited.
    pub max_read_per_second: Option<u64>,
    /// Maximum write (non-GET) requests per second per client. `None` = unlimited.
    pub max_write_per_second: Option<u64>,
    /// Unanchored regex; matching clients are rejected outright.
    pub blacklist_pattern: Option<String>,
    /// Unanchored regex; matching clients bypass rate accounting.
    pub whitelist_pattern: Option<String>,
    /// Header carrying the forwarded client address, e.g. `X-Forwarded-For`.
    pub forward_header: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub common_name_header: String,
    /// Must contain exactly one `{}` placeholder for the 1-based chain index.
    pub issuer_hash_header_template: String,
    pub max_chain_depth: u32,
    /// Tenant id -> trusted certificate-issuer hash.
    #[serde(default)]
    pub tenants: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dos: DosConfig,
    pub auth: AuthConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Fallback: parse the embedded default TOML
        let defaults: &str = include_str!("../config/default.toml");
        match ::config::Config::builder()
            .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
            .build()
        {
            Ok(cfg) => match cfg.try_deserialize() {
                Ok(app_cfg) => app_cfg,
                Err(e) => {
                    eprintln!("FATAL: Failed to deserialize default config: {}", e);
                    panic!("Failed to deserialize default config: {}", e);
                }
            },
            Err(e) => {
                eprintln!("FATAL: Failed to parse default config: {}", e);
                panic!("Failed to parse default config: {}", e);
            }
        }
    }
}

pub fn load() -> anyhow::Result<AppConfig> {
    // Load .env first (optional)
    let _ = dotenvy::dotenv();

    let defaults: &str = include_str!("../config/default.toml");
    let mut builder = ::config::Config::builder()
        .add_source(::config::File::from_str(defaults, ::config::FileFormat::Toml))
        // Optional local file: torwaechter.toml (in CWD)
        .add_source(::config::File::with_name("torwaechter").required(false));

    if let Ok(custom_path) = std::env::var("TORWAECHTER_CONFIG") {
        builder = builder.add_source(::config::File::with_name(&custom_path).required(false));
    }
    // Environment variables last to have highest precedence
    builder = builder.add_source(::config::Environment::with_prefix("TORWAECHTER").separator("__"));

    let cfg = builder.build()?;
    let app_cfg: AppConfig = cfg.try_deserialize()?;
    validate(&app_cfg)?;
    Ok(app_cfg)
}

fn validate(cfg: &AppConfig) -> anyhow::Result<()> {
    // Server
    if cfg.server.port == 0 {
        return Err(anyhow::anyhow!("invalid server.port: {}", cfg.server.port));
    }
    #[cfg(unix)]
    if cfg.server.port < 1024 {
        tracing::warn!("Using privileged port {} - may require elevated permissions", cfg.server.port);
    }

    // A threshold of zero would reject every counted request; treat it as a
    // configuration mistake instead of silently blocking all traffic.
    if cfg.dos.max_read_per_second == Some(0) {
        return Err(anyhow::anyhow!("dos.max_read_per_second must be > 0 when set"));
    }
    if cfg.dos.max_write_per_second == Some(0) {
        return Err(anyhow::anyhow!("dos.max_write_per_second must be > 0 when set"));
    }

    // Address-list patterns are compiled once at startup; surface bad
    // patterns here instead of at the first request.
    if let Some(p) = cfg.dos.blacklist_pattern.as_deref() {
        regex::Regex::new(p)
            .map_err(|e| anyhow::anyhow!("dos.blacklist_pattern is not a valid regex: {}", e))?;
    }
    if let Some(p) = cfg.dos.whitelist_pattern.as_deref() {
        regex::Regex::new(p)
            .map_err(|e| anyhow::anyhow!("dos.whitelist_pattern is not a valid regex: {}", e))?;
    }
    if cfg.dos.forward_header.trim().is_empty() {
        return Err(anyhow::anyhow!("dos.forward_header must not be empty"));
    }

    // Auth headers
    if cfg.auth.common_name_header.trim().is_empty() {
        return Err(anyhow::anyhow!("auth.common_name_header must not be empty"));
    }
    let placeholders = cfg.auth.issuer_hash_header_template.matches("{}").count();
    if placeholders != 1 {
        return Err(anyhow::anyhow!(
            "auth.issuer_hash_header_template must contain exactly one {{}} placeholder, found {}",
            placeholders
        ));
    }
    if cfg.auth.max_chain_depth == 0 {
        return Err(anyhow::anyhow!("auth.max_chain_depth must be > 0"));
    }

    Ok(())
}
