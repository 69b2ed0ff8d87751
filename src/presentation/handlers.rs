// HTTP request handlers
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::http_response::json_response;
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

/// Routes served by `serve`, without middleware.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/charts", get(list_charts))
        .route("/charts/:id", get(get_chart))
        .route("/charts/:id/stream", get(stream_chart))
        .with_state(state)
}

fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get("accept-encoding")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn list_charts(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let charts = state.envelope_service.list_charts();
    match json_response(&charts, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Full envelope chart, built on request
pub async fn get_chart(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let Some(chart) = state.envelope_service.build_chart(&id).await else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match json_response(&chart, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream a chart band by band (progressive loading)
pub async fn stream_chart(
    Path(id): Path<String>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    match state.streaming_service.stream_chart(&id) {
        Some(rx) => stream_from_receiver(rx, accepts_brotli(&headers)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
