//! Process table page handler.

use axum::{extract::State, response::Html};
use tracing::{debug, instrument};

use crate::config::Config;
use crate::state::SharedState;

const PAGE_TEMPLATE: &str = include_str!("../../assets/index.html");

/// Fills the poll intervals into the page template.
pub fn render_page(config: &Config) -> String {
    PAGE_TEMPLATE
        .replace("__FIRST_POLL_MS__", &config.first_poll_ms().to_string())
        .replace("__POLL_INTERVAL_MS__", &config.poll_interval_ms().to_string())
}

/// Handler for the / endpoint.
#[instrument(skip(state))]
pub async fn index_handler(State(state): State<SharedState>) -> Html<String> {
    debug!("Processing / request");
    state.health_stats.record_http_request();
    Html(state.index_html.clone())
}
