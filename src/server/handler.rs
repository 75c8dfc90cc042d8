//! Request Handlers
//!
//! `GET /ping` and `POST /invocations`.

use crate::metrics::Metrics;
use crate::model::Predictor;
use crate::protocol::{
    is_csv, parse_queries, resolve_topn, PredictionResponse, CUSTOM_ATTRIBUTES_HEADER,
};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Body of the 415 reply
pub const UNSUPPORTED_MEDIA_MESSAGE: &str = "This predictor only supports CSV data";

/// Shared state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub metrics: Arc<Metrics>,
}

fn plain_text(status: StatusCode, body: impl Into<String>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body.into(),
    )
        .into_response()
}

/// Health check: loads the model if needed.
///
/// 200 when the store is available, 404 when the latest load failed.
pub async fn ping(State(state): State<AppState>) -> StatusCode {
    let cache = Arc::clone(state.predictor.cache());

    match tokio::task::spawn_blocking(move || cache.get_model()).await {
        Ok(Ok(_)) => StatusCode::OK,
        Ok(Err(_)) => StatusCode::NOT_FOUND,
        Err(e) => {
            error!(error = %e, "Model load task failed");
            StatusCode::NOT_FOUND
        }
    }
}

/// Prediction: CSV queries in, ranked neighbors out.
pub async fn invocations(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !is_csv(content_type) {
        warn!(content_type = ?content_type, "Unsupported content type");
        state.metrics.record_rejected();
        return plain_text(StatusCode::UNSUPPORTED_MEDIA_TYPE, UNSUPPORTED_MEDIA_MESSAGE);
    }

    let queries = match parse_queries(&body) {
        Ok(queries) => queries,
        Err(e) => {
            warn!(error = %e, "Undecodable request body");
            state.metrics.record_rejected();
            return plain_text(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    let attributes = headers
        .get(CUSTOM_ATTRIBUTES_HEADER)
        .and_then(|v| v.to_str().ok());
    let topn = resolve_topn(attributes);

    info!(records = queries.len(), topn, "Invoked");

    let predictor = state.predictor.clone();
    let task = tokio::task::spawn_blocking(move || predictor.predict(queries.as_slice(), topn));
    let outcomes = match task.await {
        Ok(Ok(outcomes)) => outcomes,
        Ok(Err(e)) => {
            state.metrics.record_rejected();
            return plain_text(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Model is not available: {}", e),
            );
        }
        Err(e) => {
            error!(error = %e, "Prediction task failed");
            state.metrics.record_rejected();
            return plain_text(StatusCode::INTERNAL_SERVER_ERROR, "Prediction failed");
        }
    };

    let misses = outcomes.iter().filter(|o| !o.is_found()).count();
    let response = PredictionResponse::from_outcomes(&outcomes);

    let elapsed = start.elapsed();
    state
        .metrics
        .record_invocation(outcomes.len(), misses, elapsed);
    debug!(latency = ?elapsed, misses, "{}", state.metrics.summary());

    (StatusCode::OK, Json(response)).into_response()
}
