use std::env;
use std::fs;
use std::sync::Mutex;

use crate::config::{self, AppConfig};

// Environment-variable based tests mutate process-global state; serialize
// them so parallel test execution cannot interleave load() calls.
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn default_config_is_valid() {
    let _guard = ENV_LOCK.lock().unwrap();
    let result = config::load();
    assert!(result.is_ok());
}

#[test]
fn default_config_values() {
    let config = AppConfig::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.dos.max_read_per_second, Some(200));
    assert_eq!(config.dos.max_write_per_second, Some(50));
    assert_eq!(config.dos.blacklist_pattern, None);
    assert_eq!(config.dos.whitelist_pattern, None);
    assert_eq!(config.dos.forward_header, "X-Forwarded-For");
    assert_eq!(config.auth.common_name_header, "X-Ssl-Client-Cn");
    assert_eq!(config.auth.issuer_hash_header_template, "X-Ssl-Issuer-Hash-{}");
    assert_eq!(config.auth.max_chain_depth, 100);
    assert!(config.auth.tenants.is_empty());
}

#[test]
fn invalid_server_port_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("TORWAECHTER__SERVER__PORT", "0");
    let result = config::load();
    env::remove_var("TORWAECHTER__SERVER__PORT");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("invalid server.port"));
}

#[test]
fn zero_threshold_is_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("TORWAECHTER__DOS__MAX_READ_PER_SECOND", "0");
    let result = config::load();
    env::remove_var("TORWAECHTER__DOS__MAX_READ_PER_SECOND");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("max_read_per_second"));
}

#[test]
fn invalid_blacklist_pattern_fails_at_load_time() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("TORWAECHTER__DOS__BLACKLIST_PATTERN", "([unclosed");
    let result = config::load();
    env::remove_var("TORWAECHTER__DOS__BLACKLIST_PATTERN");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("blacklist_pattern"));
}

#[test]
fn issuer_hash_template_requires_exactly_one_placeholder() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("TORWAECHTER__AUTH__ISSUER_HASH_HEADER_TEMPLATE", "X-Ssl-Issuer-Hash");
    let result = config::load();
    env::remove_var("TORWAECHTER__AUTH__ISSUER_HASH_HEADER_TEMPLATE");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("placeholder"));

    env::set_var("TORWAECHTER__AUTH__ISSUER_HASH_HEADER_TEMPLATE", "X-{}-Hash-{}");
    let result = config::load();
    env::remove_var("TORWAECHTER__AUTH__ISSUER_HASH_HEADER_TEMPLATE");
    assert!(result.is_err());
}

#[test]
fn config_from_env_overrides_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    env::set_var("TORWAECHTER__SERVER__PORT", "3000");
    env::set_var("TORWAECHTER__DOS__MAX_WRITE_PER_SECOND", "7");
    env::set_var("TORWAECHTER__DOS__FORWARD_HEADER", "X-Real-Ip");

    let config = config::load().unwrap();
    assert_eq!(config.server.port, 3000);
    assert_eq!(config.dos.max_write_per_second, Some(7));
    assert_eq!(config.dos.forward_header, "X-Real-Ip");

    env::remove_var("TORWAECHTER__SERVER__PORT");
    env::remove_var("TORWAECHTER__DOS__MAX_WRITE_PER_SECOND");
    env::remove_var("TORWAECHTER__DOS__FORWARD_HEADER");
}

#[test]
fn config_from_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    let config_content = r#"
[server]
host = "0.0.0.0"
port = 9000

[dos]
blacklist_pattern = "^10\\.1\\."

[auth.tenants]
acme = "ae:11:f5:6a"
"#;
    let temp_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    fs::write(temp_file.path(), config_content).unwrap();
    env::set_var("TORWAECHTER_CONFIG", temp_file.path());

    let config = config::load().unwrap();
    env::remove_var("TORWAECHTER_CONFIG");

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.dos.blacklist_pattern.as_deref(), Some("^10\\.1\\."));
    // Keys absent from the file keep the embedded defaults.
    assert_eq!(config.dos.max_read_per_second, Some(200));
    assert_eq!(config.auth.tenants.get("acme").map(String::as_str), Some("ae:11:f5:6a"));
}
