//! HTTP endpoint handlers for the server.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Process table page
//! - `/data`: Current process snapshot as JSON
//! - `/health`: Health check endpoint

use axum::{routing::get, Router};

use crate::state::SharedState;

pub mod data;
pub mod health;
pub mod index;

// Re-export handlers
pub use data::data_handler;
pub use health::health_handler;
pub use index::index_handler;

/// Builds the router. `/health` is mounted only when enabled in the config.
pub fn router(state: SharedState) -> Router {
    let mut app = Router::new()
        .route("/", get(index_handler))
        .route("/data", get(data_handler));

    if state.config.enable_health() {
        app = app.route("/health", get(health_handler));
    }

    app.with_state(state)
}
