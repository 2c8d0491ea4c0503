//! CLI command implementations for ajaxtop.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Process table readability check
//! - `config`: Configuration file generation
//! - `sample`: Run sampling passes from the command line
//! - `generate`: Test data generation

pub mod check;
pub mod config;
pub mod generate;
pub mod sample;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use generate::command_generate_testdata;
pub use sample::command_sample;
