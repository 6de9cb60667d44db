//! Backend relay: one-shot forwarding to the agentic RAG backend.
//!
//! Every call is a single request with no retry and no client-side timeout. Content
//! endpoints go through [`BackendRelay::call_or_fallback`], which swallows any failure and
//! substitutes a mock payload; only the health probe reports the failure to its caller.

use serde::Serialize;
use serde_json::Value;

use crate::config::normalize_base_url;

/// Backend routes the gateway forwards to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEndpoint {
    Generate,
    Data,
    SearchSimilar,
    SearchText,
    AgentHealth,
}

impl BackendEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            BackendEndpoint::Generate => "/api/generate",
            BackendEndpoint::Data => "/api/data",
            BackendEndpoint::SearchSimilar => "/api/search/similar",
            BackendEndpoint::SearchText => "/api/search/text",
            BackendEndpoint::AgentHealth => "/api/agent/health",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Backend responded with status: {0}")]
    Status(u16),
    #[error("Backend response was not JSON: {0}")]
    Decode(String),
}

/// Shared HTTP client bound to one backend base URL.
#[derive(Clone)]
pub struct BackendRelay {
    base_url: String,
    client: reqwest::Client,
}

impl BackendRelay {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: BackendEndpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// POST `payload` as JSON and return the backend's JSON body. Non-2xx is an error.
    pub async fn forward<P: Serialize + ?Sized>(
        &self,
        endpoint: BackendEndpoint,
        payload: &P,
    ) -> Result<Value, BackendError> {
        let res = self
            .client
            .post(self.url_for(endpoint))
            .json(payload)
            .send()
            .await?;
        Self::read_json(res).await
    }

    /// GET the backend's agent health document.
    pub async fn health(&self) -> Result<Value, BackendError> {
        let res = self
            .client
            .get(self.url_for(BackendEndpoint::AgentHealth))
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Self::read_json(res).await
    }

    /// Forward, and on any failure log it and return `fallback()` instead.
    pub async fn call_or_fallback<P, F>(
        &self,
        endpoint: BackendEndpoint,
        payload: &P,
        fallback: F,
    ) -> Value
    where
        P: Serialize + ?Sized,
        F: FnOnce() -> Value,
    {
        match self.forward(endpoint, payload).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    endpoint = endpoint.path(),
                    backend = %self.base_url,
                    "Backend connection error: {}; serving fallback",
                    e
                );
                fallback()
            }
        }
    }

    async fn read_json(res: reqwest::Response) -> Result<Value, BackendError> {
        let status = res.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        let text = res.text().await?;
        serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;

    /// Serves `app` on an ephemeral port and returns its base URL.
    async fn spawn_backend(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// A base URL nothing listens on.
    async fn dead_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    #[test]
    fn url_for_joins_without_double_slash() {
        let relay = BackendRelay::new("http://localhost:5000/");
        assert_eq!(
            relay.url_for(BackendEndpoint::SearchSimilar),
            "http://localhost:5000/api/search/similar"
        );
        assert_eq!(
            relay.url_for(BackendEndpoint::AgentHealth),
            "http://localhost:5000/api/agent/health"
        );
    }

    #[tokio::test]
    async fn forward_returns_backend_json_verbatim() {
        let app = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                Json(json!({ "text": format!("echo {}", body["prompt"].as_str().unwrap_or("")), "model": "typhoon" }))
            }),
        );
        let relay = BackendRelay::new(&spawn_backend(app).await);
        let body = relay
            .forward(BackendEndpoint::Generate, &json!({ "prompt": "hi" }))
            .await
            .unwrap();
        assert_eq!(body, json!({ "text": "echo hi", "model": "typhoon" }));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let app = Router::new().route(
            "/api/data",
            post(|| async { (StatusCode::BAD_GATEWAY, Json(json!({ "error": "down" }))) }),
        );
        let relay = BackendRelay::new(&spawn_backend(app).await);
        let err = relay
            .forward(BackendEndpoint::Data, &json!({ "content": "x" }))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Status(502)));
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let app = Router::new().route("/api/agent/health", get(|| async { "OK" }));
        let relay = BackendRelay::new(&spawn_backend(app).await);
        let err = relay.health().await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn call_or_fallback_substitutes_on_connection_failure() {
        let relay = BackendRelay::new(&dead_backend().await);
        let body = relay
            .call_or_fallback(BackendEndpoint::SearchText, &json!({ "query": "q" }), || {
                json!({ "results": ["mock"] })
            })
            .await;
        assert_eq!(body, json!({ "results": ["mock"] }));
    }

    #[tokio::test]
    async fn call_or_fallback_skips_fallback_on_success() {
        let app = Router::new().route(
            "/api/search/similar",
            post(|| async { Json(json!({ "results": ["real"] })) }),
        );
        let relay = BackendRelay::new(&spawn_backend(app).await);
        let body = relay
            .call_or_fallback(BackendEndpoint::SearchSimilar, &json!({ "query": "q" }), || {
                panic!("fallback must not run when the backend answers")
            })
            .await;
        assert_eq!(body, json!({ "results": ["real"] }));
    }
}
