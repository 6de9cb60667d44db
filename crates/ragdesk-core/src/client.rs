//! Client for the gateway's proxy surface (`/api/generate`, `/api/data`, `/api/search/*`,
//! `/api/health`). The forms talk to the gateway only through [`RelayApi`].

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::normalize_base_url;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Current UTC time as `2024-03-01T10:15:30.123Z`, the format every report carries.
pub fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("gateway responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("gateway response missing `{0}`")]
    MissingField(&'static str),
}

/// Connectivity report from `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend_health: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_connected(&self) -> bool {
        self.status == "connected"
    }

    /// Report used when the gateway itself could not be asked.
    pub fn unreachable(backend: &str) -> Self {
        Self {
            status: "error".to_string(),
            backend: backend.to_string(),
            timestamp: iso_now(),
            backend_health: None,
            error: None,
        }
    }
}

/// Operations the forms need from the gateway.
#[async_trait::async_trait]
pub trait RelayApi: Send + Sync {
    async fn check_health(&self) -> HealthReport;
    /// Returns the id the backend assigned to the stored content.
    async fn store_data(&self, content: &str, context: &str) -> Result<String, RelayError>;
    /// Failures yield an empty list.
    async fn search_similar(&self, query: &str, limit: usize) -> Vec<String>;
    /// Failures yield an empty list.
    async fn search_by_text(&self, query: &str, limit: usize) -> Vec<String>;
    async fn generate_text(&self, prompt: &str) -> Result<String, RelayError>;
}

/// reqwest implementation of [`RelayApi`] against a running gateway.
#[derive(Clone)]
pub struct RelayClient {
    gateway_url: String,
    backend_url: String,
    client: reqwest::Client,
}

impl RelayClient {
    /// `backend_url` is only used to label the report when the gateway is unreachable.
    pub fn new(gateway_url: &str, backend_url: &str) -> Self {
        Self {
            gateway_url: normalize_base_url(gateway_url),
            backend_url: normalize_base_url(backend_url),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.gateway_url, path)
    }

    async fn post_json(&self, path: &str, body: Value) -> Result<Value, RelayError> {
        let res = self.client.post(self.url(path)).json(&body).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.json::<Value>().await?)
    }

    async fn search(&self, path: &str, query: &str, limit: usize) -> Vec<String> {
        match self
            .post_json(path, json!({ "query": query, "limit": limit }))
            .await
        {
            Ok(body) => results_from(body),
            Err(e) => {
                tracing::error!("Error searching via {}: {}", path, e);
                Vec::new()
            }
        }
    }
}

/// `results` array of the body, or the body itself when it is already an array.
fn results_from(body: Value) -> Vec<String> {
    let list = match body {
        Value::Object(mut map) => map.remove("results").unwrap_or(Value::Null),
        other => other,
    };
    match list {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[async_trait::async_trait]
impl RelayApi for RelayClient {
    async fn check_health(&self) -> HealthReport {
        let res = match self.client.get(self.url("/api/health")).send().await {
            Ok(res) => res,
            Err(e) => {
                tracing::error!("Health check failed: {}", e);
                return HealthReport::unreachable(&self.backend_url);
            }
        };
        let status = res.status();
        // 503 means the gateway is up and reporting the backend as disconnected.
        if status.is_success() || status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
            match res.json::<HealthReport>().await {
                Ok(report) => return report,
                Err(e) => tracing::error!("Health check body unreadable: {}", e),
            }
        } else {
            tracing::error!("Health check failed with status {}", status);
        }
        HealthReport::unreachable(&self.backend_url)
    }

    async fn store_data(&self, content: &str, context: &str) -> Result<String, RelayError> {
        let body = self
            .post_json("/api/data", json!({ "content": content, "context": context }))
            .await
            .inspect_err(|e| tracing::error!("Error storing data: {}", e))?;
        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(RelayError::MissingField("id"))
    }

    async fn search_similar(&self, query: &str, limit: usize) -> Vec<String> {
        self.search("/api/search/similar", query, limit).await
    }

    async fn search_by_text(&self, query: &str, limit: usize) -> Vec<String> {
        self.search("/api/search/text", query, limit).await
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, RelayError> {
        let body = self
            .post_json("/api/generate", json!({ "prompt": prompt }))
            .await
            .inspect_err(|e| tracing::error!("Error generating text: {}", e))?;
        body.get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(RelayError::MissingField("text"))
    }
}
