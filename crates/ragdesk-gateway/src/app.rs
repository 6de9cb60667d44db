//! Router assembly and shared state.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Method, Request},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use ragdesk_core::BackendRelay;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::handlers;

pub struct AppState {
    pub relay: BackendRelay,
}

impl AppState {
    pub fn new(backend_url: &str) -> Self {
        Self {
            relay: BackendRelay::new(backend_url),
        }
    }
}

pub fn build_app(state: Arc<AppState>) -> Router {
    // Local UIs only (any localhost / 127.0.0.1 origin).
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            let s = origin.to_str().unwrap_or("");
            s.starts_with("http://localhost") || s.starts_with("http://127.0.0.1")
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/api/generate", post(handlers::generate))
        .route("/api/data", post(handlers::store_data))
        .route("/api/search/similar", post(handlers::search_similar))
        .route("/api/search/text", post(handlers::search_text))
        .route("/api/health", get(handlers::health))
        .with_state(state)
        .layer(cors)
        .layer(axum::middleware::from_fn(log_requests))
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        "{} {} -> {} ({} ms)",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );
    response
}
