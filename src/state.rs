//! Application state management for the server.
//!
//! The sampler, with its smoothing and CPU caches, is the only mutable
//! state. It sits behind a mutex so concurrent `/data` requests run their
//! passes one after another.

use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::health_stats::HealthStats;
use crate::sampler::DynSampler;
use crate::source::ProcessSource;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    pub sampler: Arc<Mutex<DynSampler>>,
    pub config: Arc<Config>,
    pub health_stats: Arc<HealthStats>,
    /// Page HTML with poll intervals filled in.
    pub index_html: String,
}

impl AppState {
    pub fn new(source: Box<dyn ProcessSource>, config: Config) -> SharedState {
        let index_html = crate::handlers::index::render_page(&config);
        Arc::new(Self {
            sampler: Arc::new(Mutex::new(DynSampler::new(source))),
            config: Arc::new(config),
            health_stats: Arc::new(HealthStats::new()),
            index_html,
        })
    }
}
