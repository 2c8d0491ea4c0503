//! Health check endpoint handler.
//!
//! Returns a plain-text table of sampling statistics. The status is 503
//! while the most recent sampling pass failed.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    state.health_stats.record_http_request();

    let (status, message) = if state.health_stats.last_pass_failed() {
        (StatusCode::SERVICE_UNAVAILABLE, "Last sample pass failed")
    } else if state.health_stats.total_passes() == 0 {
        (StatusCode::OK, "OK - No sample pass yet")
    } else {
        (StatusCode::OK, "OK")
    };

    let table = state.health_stats.render_table();

    debug!("Health check: {} - {}", status, message);
    (
        status,
        [("Content-Type", "text/plain; charset=utf-8")],
        format!("{message}\n\n{table}"),
    )
}
