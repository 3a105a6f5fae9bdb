use std::sync::Arc;

use axum::{Json, body::Body, extract::State, http::HeaderMap};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{
    error::ApiError,
    models::{LogAccepted, LogRequest, ProcessRequest},
    payload::{decode, is_error_payload},
    state::AppState,
    utils::{read_body, require_json},
    validation::{validate_log_request, validate_process_request},
};

/// Health endpoint (GET /health)
///
/// `ok` answers 200; `degraded` and `down` answer 503 with the same body so
/// load balancers can act on the status code alone.
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let payload = decode(&state.api.health());

    match payload.get("status").and_then(Value::as_str) {
        Some("ok") => Ok(Json(payload)),
        Some("degraded") | Some("down") => {
            debug!(status = ?payload.get("status"), "Health check reports unavailable");
            Err(ApiError::Unavailable(payload))
        }
        _ => Err(ApiError::Engine(payload)),
    }
}

/// Log submission endpoint (POST /logs)
///
/// Fields are checked against the engine bounds first, so malformed input
/// is a 400 and never reaches the engine. Engine-side rejections (capacity,
/// lifecycle) are a 500 with the reason in `error`.
///
/// The enqueue runs on the blocking pool like `/process`, since reaching
/// `auto_process_threshold` drains a whole batch inside the call.
pub async fn add_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<LogAccepted>, ApiError> {
    require_json(&headers)?;

    let limit = state.config.server.api.max_body_bytes.as_usize();
    let body_bytes = read_body(body, limit).await?;

    let request: LogRequest = serde_json::from_slice(&body_bytes)?;
    validate_log_request(&request)?;

    let engine = Arc::clone(state.engine());
    let id = tokio::task::spawn_blocking(move || {
        engine.add_log(&request.level, &request.source, &request.message)
    })
    .await
    .map_err(|err| ApiError::Internal(format!("log submission task failed: {err}")))?
    .map_err(|err| {
        warn!(error = %err, code = err.code(), "Log submission rejected by engine");
        ApiError::Engine(json!({ "error": err.to_string(), "code": err.code() }))
    })?;

    Ok(Json(LogAccepted::new(id)))
}

/// Pending entries endpoint (GET /logs)
pub async fn pending_logs(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    passthrough(decode(&state.api.get_pending_logs()))
}

/// Processing endpoint (POST /process)
///
/// The batch runs on the blocking pool; a large drain must not stall the
/// async workers. A `partial` batch is still a 200.
pub async fn process_queue(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<Value>, ApiError> {
    let limit = state.config.server.api.max_body_bytes.as_usize();
    let body_bytes = read_body(body, limit).await?;

    let request = if body_bytes.is_empty() {
        ProcessRequest::default()
    } else {
        require_json(&headers)?;
        serde_json::from_slice::<ProcessRequest>(&body_bytes)?
    };
    validate_process_request(&request, state.config.server.api.max_process_items)?;

    let api = state.api.clone();
    let raw = tokio::task::spawn_blocking(move || api.process_queue(request.max_items))
        .await
        .map_err(|err| ApiError::Internal(format!("processing task failed: {err}")))?;

    passthrough(decode(&raw))
}

/// Metrics endpoint (GET /metrics)
pub async fn metrics(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    passthrough(decode(&state.api.get_metrics()))
}

fn passthrough(payload: Value) -> Result<Json<Value>, ApiError> {
    if is_error_payload(&payload) {
        return Err(ApiError::Engine(payload));
    }
    Ok(Json(payload))
}
