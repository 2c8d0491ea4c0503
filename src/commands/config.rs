//! Config command implementation.

use anyhow::Context;
use std::fs;
use std::path::PathBuf;

use ajaxtop::config::Config;

use crate::cli::ConfigFormat;

/// Serializes `config` in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Writes the default configuration to `output` ("-" for stdout).
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from("ajaxtop.yaml"));

    let mut content = render_config(&Config::default(), format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# ajaxtop Configuration
# =====================
#
# Server
# ------
# bind: "127.0.0.1"            # Listen address (0.0.0.0 = all interfaces)
# port: 5000                   # HTTP port
#
# Process Source
# --------------
# proc_root: "/proc"           # procfs mount to read
# passwd_file: "/etc/passwd"   # uid -> user name database
#
# Page
# ----
# first_poll_ms: 500           # Delay before the page first polls /data
# poll_interval_ms: 2000       # Page poll interval (>= 100)
#
# Feature Flags
# -------------
# enable_health: true          # Mount /health
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}
