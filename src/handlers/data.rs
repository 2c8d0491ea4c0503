//! Process snapshot endpoint handler.
//!
//! Every `/data` request runs one full sampling pass and returns the
//! records as a pretty-printed JSON array.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, error, instrument};

use crate::error::SampleError;
use crate::record::ProcessRecord;
use crate::state::SharedState;

/// Error type for `/data` failures.
#[derive(Debug)]
pub enum DataError {
    Sample(SampleError),
    EncodingFailed(serde_json::Error),
    TaskFailed(tokio::task::JoinError),
}

impl IntoResponse for DataError {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            DataError::Sample(e) => format!("Failed to sample processes: {e}"),
            DataError::EncodingFailed(e) => format!("Failed to encode processes: {e}"),
            DataError::TaskFailed(e) => format!("Sampling task failed: {e}"),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
    }
}

/// Serializes records as the `/data` body: 2-space indented, keys sorted.
pub fn render_records(records: &[ProcessRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(records)
}

/// Handler for the /data endpoint.
#[instrument(skip(state))]
pub async fn data_handler(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, DataError> {
    debug!("Processing /data request");
    state.health_stats.record_http_request();

    let sampler = state.sampler.clone();
    let result = tokio::task::spawn_blocking(move || {
        let mut guard = sampler.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.sample_with_report()
    })
    .await
    .map_err(|e| {
        error!("Sample task failed: {}", e);
        state.health_stats.record_failure();
        DataError::TaskFailed(e)
    })?;

    let (records, report) = match result {
        Ok(v) => v,
        Err(e) => {
            error!("Sample pass failed: {}", e);
            state.health_stats.record_failure();
            return Err(DataError::Sample(e));
        }
    };
    state.health_stats.record_pass(&report);

    let body = render_records(&records).map_err(DataError::EncodingFailed)?;
    debug!("Serving {} processes", records.len());

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    ))
}
