use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::debug;

use super::AppState;
use crate::metrics::MetricsSnapshot;
use crate::translate::{ErrorBody, HealthResponse, TranslateRequest, TranslateResponse};

type ApiError = (StatusCode, Json<ErrorBody>);

fn bad_request(error: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
}

/// `POST /api/translate`. Provider failures still answer 200, with the
/// original text and an `error` field.
pub async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    debug!(
        target_language = %request.target_language,
        chars = request.text.len(),
        "translate request"
    );
    state
        .cache
        .handle_translate(request)
        .await
        .map(Json)
        .map_err(|e| bad_request(e.to_string()))
}

/// `GET /api/translate`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.cache.health())
}

/// `GET /api/translate/metrics`.
pub async fn metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.cache.metrics().snapshot())
}
