//! ajaxtop: the local process table served as JSON to a browser table.
//!
//! The core is [`sampler::Sampler`], which takes one pass over a
//! [`source::ProcessSource`] per call and smooths each process's CPU
//! percent across passes. [`handlers`] wires it to axum.

pub mod config;
pub mod cpu;
pub mod error;
pub mod fixture;
pub mod handlers;
pub mod health_stats;
pub mod procfs;
pub mod record;
pub mod sampler;
pub mod smoothing;
pub mod source;
pub mod state;

pub use config::Config;
pub use error::{ConfigError, ReadError, SampleError};
pub use record::{ProcessRecord, Status};
pub use sampler::{DynSampler, Outcome, SampleReport, Sampler, SkipReason};
pub use source::{CpuReading, ProcessSource, RawProcess};
pub use state::{AppState, SharedState};
