//! API route handlers.
//!
//! - `POST /save-icons` stores a list of placed icons under a new session
//! - `GET /get-icons/{session_id}` returns the icons of a saved session

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use iconmark_core::PersistedIconRecord;
use serde::{Deserialize, Serialize};

use crate::health;
use crate::metrics;
use crate::sessions::StoreError;
use crate::validation::{self, ValidationError};
use crate::AppState;

/// Largest accepted request body. Icons may carry inline data URIs.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Body of `POST /save-icons`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveIconsRequest {
    /// Icons in placement order.
    #[serde(rename = "placedIcons")]
    pub placed_icons: Vec<PersistedIconRecord>,
}

/// Response of `POST /save-icons`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveIconsResponse {
    /// Identifier of the new session.
    #[serde(rename = "SessionId")]
    pub session_id: String,
}

/// Errors returned to HTTP clients as `{ "error": "..." }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Request failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Request body is not the expected JSON.
    #[error("invalid request body: {0}")]
    BadBody(String),
    /// Session does not exist.
    #[error("session not found: {0}")]
    NotFound(String),
    /// Session store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadBody(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the API and health routes.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route(
            "/save-icons",
            post(save_icons).layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .route("/get-icons/{session_id}", get(get_icons))
        .with_state(state)
}

/// Store the submitted icons under a new session id.
///
/// # Errors
///
/// Returns 400 for malformed or invalid input and 500 if the session cannot
/// be persisted.
#[tracing::instrument(name = "save_icons", skip(state, body))]
pub async fn save_icons(
    State(state): State<AppState>,
    body: Result<Json<SaveIconsRequest>, JsonRejection>,
) -> Result<Json<SaveIconsResponse>, ApiError> {
    let Json(request) = body.map_err(|e| {
        metrics::record_validation_failure("body");
        ApiError::BadBody(e.body_text())
    })?;

    validation::validate_records(&request.placed_icons).inspect_err(|e| {
        metrics::record_validation_failure(e.kind());
    })?;

    let count = request.placed_icons.len();
    let session_id = state.sessions.save(request.placed_icons)?;

    metrics::record_session_saved(count);
    metrics::set_sessions_stored(state.sessions.len());
    tracing::info!("Saved {count} icon(s) as session {session_id}");

    Ok(Json(SaveIconsResponse { session_id }))
}

/// Return the icons saved under `session_id`.
///
/// # Errors
///
/// Returns 400 for a malformed id and 404 for an unknown session.
#[tracing::instrument(name = "get_icons", skip(state))]
pub async fn get_icons(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<PersistedIconRecord>>, ApiError> {
    validation::validate_session_id(&session_id).inspect_err(|e| {
        metrics::record_validation_failure(e.kind());
    })?;

    let icons = state.sessions.get(&session_id);
    metrics::record_session_loaded(icons.is_some());
    icons.map(Json).ok_or(ApiError::NotFound(session_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SessionStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(SessionStore::new()))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn test_save_then_get() {
        let state = AppState::new(SessionStore::new());
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(post_json(
                "/save-icons",
                r#"{"placedIcons":[{"x":10,"y":20,"size":50,"imgSrc":"pin.png"}]}"#,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let id = json["SessionId"].as_str().expect("id").to_string();

        let response = app
            .oneshot(
                Request::get(format!("/get-icons/{id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json[0]["imgSrc"], "pin.png");
        assert_eq!(json[0]["size"], 50.0);
        assert_eq!(state.sessions.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_icon_is_400_with_error_body() {
        let response = app()
            .oneshot(post_json(
                "/save-icons",
                r#"{"placedIcons":[{"x":0,"y":0,"size":2,"imgSrc":"pin.png"}]}"#,
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().expect("error").contains("size"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_400() {
        let response = app()
            .oneshot(post_json("/save-icons", r#"{"icons":[]}"#))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let response = app()
            .oneshot(
                Request::get("/get-icons/does-not-exist")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_session_id_is_400() {
        let long = "a".repeat(65);
        let response = app()
            .oneshot(
                Request::get(format!("/get-icons/{long}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_error_status() {
        assert_eq!(
            ApiError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Store(StoreError::NoDataDir).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
