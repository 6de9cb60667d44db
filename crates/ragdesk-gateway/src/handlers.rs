//! Proxy routes. Each content route validates its required field, forwards once to the
//! backend and masks any backend failure with a mock payload (status stays 200).
//! `/api/health` is the exception: a failed probe is reported as 503.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ragdesk_core::{fallback, iso_now, BackendEndpoint};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

const DATA_LOG_PREVIEW_CHARS: usize = 50;

// Fields stay loosely typed: whatever the caller sent is relayed to the backend as-is.

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DataRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SearchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Value>,
}

/// Bodies are read as raw bytes so a missing content type is tolerated; anything that is
/// not a JSON object becomes a 500 with `message`.
fn parse_body<T: DeserializeOwned>(body: &Bytes, message: &'static str) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::error!("{}: {}", message, e);
        ApiError::Internal(message)
    })
}

/// `null`, `false`, `0` and `""` count as missing.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn required(field: Option<Value>, message: &'static str) -> Result<Value, ApiError> {
    field
        .filter(is_truthy)
        .ok_or(ApiError::Validation(message))
}

/// Text used when a value is echoed into a mock payload.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Only a non-negative integer `limit` caps the canned results.
fn canned_limit(limit: Option<&Value>) -> Option<usize> {
    limit
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

/// POST /api/generate `{prompt}` -> `{text}`.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req: GenerateRequest = parse_body(&body, "Failed to generate text")?;
    let prompt = required(req.prompt, "Prompt is required")?;

    let backend_url = state.relay.base_url();
    let reply = state
        .relay
        .call_or_fallback(BackendEndpoint::Generate, &json!({ "prompt": prompt }), || {
            fallback::generate_payload(&display_value(&prompt), backend_url)
        })
        .await;
    Ok(Json(reply))
}

/// POST /api/data `{content, context}` -> `{id}`.
pub async fn store_data(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let req: DataRequest = parse_body(&body, "Failed to store data")?;
    let content = required(req.content, "Content is required")?;
    let payload = DataRequest {
        content: Some(content),
        context: req.context,
    };

    let reply = state
        .relay
        .call_or_fallback(BackendEndpoint::Data, &payload, || {
            let preview: String = payload
                .content
                .as_ref()
                .map(display_value)
                .unwrap_or_default()
                .chars()
                .take(DATA_LOG_PREVIEW_CHARS)
                .collect();
            tracing::info!(content = %preview, context = ?payload.context, "Storing data (mock)");
            fallback::data_payload()
        })
        .await;
    Ok(Json(reply))
}

/// POST /api/search/similar `{query, limit?}` -> `{results}`.
pub async fn search_similar(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    search(
        &state,
        &body,
        BackendEndpoint::SearchSimilar,
        "Failed to perform similarity search",
        fallback::similar_payload,
    )
    .await
}

/// POST /api/search/text `{query, limit?}` -> `{results}`.
pub async fn search_text(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    search(
        &state,
        &body,
        BackendEndpoint::SearchText,
        "Failed to perform text search",
        fallback::text_search_payload,
    )
    .await
}

async fn search(
    state: &AppState,
    body: &Bytes,
    endpoint: BackendEndpoint,
    failure: &'static str,
    mock: fn(&str, Option<usize>) -> Value,
) -> Result<Json<Value>, ApiError> {
    let req: SearchRequest = parse_body(body, failure)?;
    let query = required(req.query, "Query is required")?;
    let payload = SearchRequest {
        query: Some(query),
        limit: req.limit,
    };

    let reply = state
        .relay
        .call_or_fallback(endpoint, &payload, || {
            let query = payload.query.as_ref().map(display_value).unwrap_or_default();
            mock(&query, canned_limit(payload.limit.as_ref()))
        })
        .await;
    Ok(Json(reply))
}

/// GET /api/health: 200 `{status:"connected", backend, backendHealth, timestamp}` or
/// 503 `{status:"disconnected", backend, error, timestamp}`.
pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let backend = state.relay.base_url();
    match state.relay.health().await {
        Ok(data) => Json(json!({
            "status": "connected",
            "backend": backend,
            "backendHealth": data,
            "timestamp": iso_now(),
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Backend health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "disconnected",
                    "backend": backend,
                    "error": e.to_string(),
                    "timestamp": iso_now(),
                })),
            )
                .into_response()
        }
    }
}
