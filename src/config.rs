//! Configuration file handling.
//!
//! Every field is optional; missing values fall back to the defaults below.
//! Files are YAML unless their extension says `.json` or `.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ConfigError;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_PASSWD_FILE: &str = "/etc/passwd";
pub const DEFAULT_FIRST_POLL_MS: u64 = 500;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

const MIN_POLL_INTERVAL_MS: u64 = 100;
const MAX_FIRST_POLL_MS: u64 = 60_000;

const LOG_LEVELS: &[&str] = &["off", "error", "warn", "info", "debug", "trace"];

/// Default config file locations, searched in order.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "/etc/ajaxtop/ajaxtop.yaml",
    "/etc/ajaxtop/ajaxtop.yml",
    "/etc/ajaxtop/ajaxtop.json",
    "./ajaxtop.yaml",
    "./ajaxtop.yml",
    "./ajaxtop.json",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub bind: Option<String>,
    pub port: Option<u16>,

    // Process source
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "passwd-file")]
    pub passwd_file: Option<PathBuf>,

    // Page polling
    #[serde(alias = "first-poll-ms")]
    pub first_poll_ms: Option<u64>,
    #[serde(alias = "poll-interval-ms")]
    pub poll_interval_ms: Option<u64>,

    // Feature flags
    #[serde(alias = "enable-health")]
    pub enable_health: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            passwd_file: Some(PathBuf::from(DEFAULT_PASSWD_FILE)),
            first_poll_ms: Some(DEFAULT_FIRST_POLL_MS),
            poll_interval_ms: Some(DEFAULT_POLL_INTERVAL_MS),
            enable_health: Some(true),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn proc_root(&self) -> &Path {
        self.proc_root
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PROC_ROOT))
    }

    pub fn passwd_file(&self) -> &Path {
        self.passwd_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_PASSWD_FILE))
    }

    pub fn first_poll_ms(&self) -> u64 {
        self.first_poll_ms.unwrap_or(DEFAULT_FIRST_POLL_MS)
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS)
    }

    pub fn enable_health(&self) -> bool {
        self.enable_health.unwrap_or(true)
    }

    /// Fills unset fields from [`Config::default`].
    pub fn with_defaults(self) -> Self {
        let d = Config::default();
        Self {
            bind: self.bind.or(d.bind),
            port: self.port.or(d.port),
            proc_root: self.proc_root.or(d.proc_root),
            passwd_file: self.passwd_file.or(d.passwd_file),
            first_poll_ms: self.first_poll_ms.or(d.first_poll_ms),
            poll_interval_ms: self.poll_interval_ms.or(d.poll_interval_ms),
            enable_health: self.enable_health.or(d.enable_health),
            log_level: self.log_level.or(d.log_level),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.port() == 0 {
        return Err(ConfigError::Invalid("port must not be 0".into()));
    }

    if cfg.bind().parse::<IpAddr>().is_err() {
        return Err(ConfigError::Invalid(format!(
            "bind '{}' is not an IP address",
            cfg.bind()
        )));
    }

    if cfg.poll_interval_ms() < MIN_POLL_INTERVAL_MS {
        return Err(ConfigError::Invalid(format!(
            "poll_interval_ms must be at least {}, got {}",
            MIN_POLL_INTERVAL_MS,
            cfg.poll_interval_ms()
        )));
    }

    if cfg.first_poll_ms() > MAX_FIRST_POLL_MS {
        return Err(ConfigError::Invalid(format!(
            "first_poll_ms must be at most {}, got {}",
            MAX_FIRST_POLL_MS,
            cfg.first_poll_ms()
        )));
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level '{}', expected one of {}",
                level,
                LOG_LEVELS.join(", ")
            )));
        }
    }

    Ok(())
}

/// Parses config `content`, choosing the format from `path`'s extension.
pub fn parse_config(path: &Path, content: &str) -> Result<Config, ConfigError> {
    let parse_err = |message: String| ConfigError::Parse {
        path: path.display().to_string(),
        message,
    };

    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        Some("toml") => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        _ => serde_yaml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
    };
    Ok(config.with_defaults())
}

/// Loads configuration from `path`, or from the first existing default
/// location. No file at all yields [`Config::default`].
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let config = parse_config(&path, &content)?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}
