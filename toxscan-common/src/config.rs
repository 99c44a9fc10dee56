//! Configuration loading and setting resolution
//!
//! Bootstrap configuration lives in a TOML file. Individual settings resolve
//! in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Built-in default (fallback)
//!
//! A missing TOML file is not an error; an unparseable one is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the external analysis backend
pub const BACKEND_URL_ENV: &str = "TOXSCAN_BACKEND_URL";

/// Environment variable naming the relay the client submits to
pub const RELAY_URL_ENV: &str = "TOXSCAN_RELAY_URL";

/// Default relay listen port
pub const DEFAULT_PORT: u16 = 5740;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// External analysis backend base URL (relay side)
    #[serde(default)]
    pub backend_url: Option<String>,

    /// Relay base URL (client side)
    #[serde(default)]
    pub relay_url: Option<String>,

    /// Serve fixed demo data when no backend is configured. Off unless set.
    #[serde(default)]
    pub demo_fallback: bool,

    #[serde(default)]
    pub listen: ListenConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub client: ClientConfig,
}

/// Relay listen address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Client-side capture settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Recording elapsed-time tick, milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_tick_interval_ms() -> u64 {
    1000
}

/// Platform config file location (`~/.config/toxscan/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("toxscan").join("config.toml"))
}

/// Load the TOML configuration.
///
/// With an explicit path the file must exist. Without one, the platform
/// default location is tried and built-in defaults are used when absent.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Non-empty, non-whitespace
pub fn is_set(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Resolve one optional URL setting across CLI → ENV → TOML.
///
/// Blank values count as unset. Trailing slashes are removed. Returns `None`
/// when no tier carries a value; callers decide what absence means.
pub fn resolve_url(
    setting: &str,
    cli_value: Option<&str>,
    env_var_name: &str,
    toml_value: Option<&str>,
) -> Option<String> {
    let env_value = std::env::var(env_var_name).ok();

    let tiers = [
        ("command line", cli_value),
        ("environment", env_value.as_deref()),
        ("TOML", toml_value),
    ];

    let present: Vec<(&str, &str)> = tiers
        .iter()
        .filter_map(|(source, value)| value.filter(|v| is_set(v)).map(|v| (*source, v)))
        .collect();

    if present.len() > 1 {
        let sources: Vec<&str> = present.iter().map(|(source, _)| *source).collect();
        warn!(
            "{} found in multiple sources: {}. Using {} (highest priority).",
            setting,
            sources.join(", "),
            sources[0]
        );
    }

    present.first().map(|(source, value)| {
        info!("{} loaded from {}", setting, source);
        value.trim().trim_end_matches('/').to_string()
    })
}

/// Resolve the external analysis backend endpoint
pub fn resolve_backend_url(cli_value: Option<&str>, toml: &TomlConfig) -> Option<String> {
    resolve_url(
        "Analysis backend URL",
        cli_value,
        BACKEND_URL_ENV,
        toml.backend_url.as_deref(),
    )
}

/// Resolve the relay endpoint, defaulting to the local relay address
pub fn resolve_relay_url(cli_value: Option<&str>, toml: &TomlConfig) -> String {
    resolve_url("Relay URL", cli_value, RELAY_URL_ENV, toml.relay_url.as_deref())
        .unwrap_or_else(|| format!("http://{}:{}", toml.listen.host, toml.listen.port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.backend_url, None);
        assert!(!config.demo_fallback);
        assert_eq!(config.listen.port, DEFAULT_PORT);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.client.tick_interval_ms, 1000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            backend_url = "http://backend:5000"

            [listen]
            port = 8080
            "#,
        )
        .unwrap();
        assert_eq!(config.backend_url.as_deref(), Some("http://backend:5000"));
        assert_eq!(config.listen.host, "127.0.0.1");
        assert_eq!(config.listen.port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_is_set() {
        assert!(is_set("http://x"));
        assert!(!is_set(""));
        assert!(!is_set("   "));
    }
}
