//! CLI arguments and subcommands for ajaxtop.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parses a config-file level name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "ajaxtop",
    about = "Browser-based top: serves the process table as JSON plus a live-updating page",
    long_about = "Browser-based top: serves the process table as JSON plus a live-updating page.\n\n\
                  Every request to /data takes one pass over /proc and returns one record per \
                  readable process, with instantaneous and smoothed CPU percent. The page at / \
                  polls /data and renders a sortable, highlighted table.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// HTTP listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Bind to specific interface/IP
    #[arg(long)]
    pub bind: Option<IpAddr>,

    /// Log level (overrides the config file)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Root of the proc filesystem to read
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Disable /health endpoint
    #[arg(long)]
    pub disable_health: bool,

    /// Path to JSON test data file (uses synthetic data instead of /proc)
    #[arg(short = 't', long)]
    pub test_data_file: Option<PathBuf>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the process table is readable
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run sampling passes and print the last snapshot
    Sample {
        /// Number of passes
        #[arg(short = 'n', long, default_value_t = 2)]
        iterations: usize,

        /// Delay between passes in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Print a summary instead of the JSON snapshot
        #[arg(long)]
        summary: bool,
    },

    /// Generate synthetic test data JSON file
    GenerateTestdata {
        /// Output file path
        #[arg(short = 'o', long, default_value = "testdata.json")]
        output: PathBuf,

        /// Number of processes to generate
        #[arg(long, default_value_t = 24)]
        count: usize,

        /// CPU percent samples per process
        #[arg(long, default_value_t = 8)]
        samples: usize,

        /// Mark every Nth process as failing (0 = none)
        #[arg(long, default_value_t = 0)]
        failure_every: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_server_flags() {
        let args = Args::try_parse_from([
            "ajaxtop",
            "-p",
            "8080",
            "--bind",
            "0.0.0.0",
            "--log-level",
            "debug",
            "--disable-health",
        ])
        .unwrap();
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.bind.map(|b| b.to_string()).as_deref(), Some("0.0.0.0"));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert!(args.disable_health);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_parse_sample_subcommand() {
        let args = Args::try_parse_from(["ajaxtop", "sample", "-n", "3", "--summary"]).unwrap();
        match args.command {
            Some(Commands::Sample {
                iterations,
                interval_ms,
                summary,
            }) => {
                assert_eq!(iterations, 3);
                assert_eq!(interval_ms, 1000);
                assert!(summary);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_log_level_from_name() {
        assert_eq!(LogLevel::from_name("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_name("loud"), None);
    }
}
