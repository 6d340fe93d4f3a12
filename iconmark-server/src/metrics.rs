//! Prometheus metrics for iconmark-server.
//!
//! Provides metrics collection and a Prometheus-compatible `/metrics` endpoint.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

const HTTP_REQUESTS_TOTAL: &str = "iconmark_http_requests_total";
const HTTP_REQUEST_DURATION: &str = "iconmark_http_request_duration_seconds";
const SESSIONS_SAVED_TOTAL: &str = "iconmark_sessions_saved_total";
const SESSIONS_LOADED_TOTAL: &str = "iconmark_sessions_loaded_total";
const SESSIONS_STORED: &str = "iconmark_sessions_stored";
const ICONS_SAVED_TOTAL: &str = "iconmark_icons_saved_total";
const VALIDATION_FAILURES_TOTAL: &str = "iconmark_validation_failures_total";

/// Initialize metrics and return the Prometheus handle.
///
/// # Errors
///
/// Returns an error if the Prometheus recorder cannot be installed
/// (e.g., if another recorder is already installed).
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record an HTTP request.
///
/// # Arguments
///
/// * `method` - HTTP method (GET, POST, etc.)
/// * `path` - Route template, not the raw path
/// * `status` - HTTP status code
/// * `duration_secs` - Request duration in seconds
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        HTTP_REQUEST_DURATION,
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

/// Record a successful save of `icon_count` icons.
pub fn record_session_saved(icon_count: usize) {
    counter!(SESSIONS_SAVED_TOTAL).increment(1);
    counter!(ICONS_SAVED_TOTAL).increment(icon_count as u64);
}

/// Record a session lookup.
///
/// # Arguments
///
/// * `found` - Whether the session existed
pub fn record_session_loaded(found: bool) {
    counter!(
        SESSIONS_LOADED_TOTAL,
        "found" => found.to_string()
    )
    .increment(1);
}

/// Update the number of stored sessions.
#[allow(clippy::cast_precision_loss)]
pub fn set_sessions_stored(count: usize) {
    gauge!(SESSIONS_STORED).set(count as f64);
}

/// Record an input validation failure.
///
/// # Arguments
///
/// * `validation_type` - Type of validation that failed (session_id, icon_size, etc.)
pub fn record_validation_failure(validation_type: &str) {
    counter!(
        VALIDATION_FAILURES_TOTAL,
        "type" => validation_type.to_string()
    )
    .increment(1);
}

/// Middleware timing every request and recording it against its route.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());

    let response = next.run(request).await;

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    response
}

/// Prometheus metrics endpoint.
#[tracing::instrument(name = "metrics", skip(handle))]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Without an installed recorder these are no-ops; they must not panic.
    #[test]
    fn test_recording_without_recorder_is_harmless() {
        record_http_request("GET", "/health", 200, 0.001);
        record_session_saved(3);
        record_session_loaded(false);
        set_sessions_stored(1);
        record_validation_failure("icon_size");
    }

    #[test]
    fn test_local_recorder_renders_counters() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        metrics::with_local_recorder(&recorder, || {
            record_session_saved(4);
            record_validation_failure("coordinate");
        });

        let text = handle.render();
        assert!(text.contains(SESSIONS_SAVED_TOTAL));
        assert!(text.contains(ICONS_SAVED_TOTAL));
        assert!(text.contains("type=\"coordinate\""));
    }
}
