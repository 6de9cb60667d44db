//! Similarity / full-text search form.

use std::sync::Arc;

use super::FormStatus;
use crate::client::{RelayApi, DEFAULT_SEARCH_LIMIT};

pub const EMPTY_QUERY_MESSAGE: &str = "Search query cannot be empty";
pub const NO_RESULTS_MESSAGE: &str = "No results found for your query";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Similarity,
    Text,
}

impl SearchKind {
    pub fn title(self) -> &'static str {
        match self {
            SearchKind::Similarity => "Search by Similarity",
            SearchKind::Text => "Search by Text",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            SearchKind::Similarity => "Enter search query to find semantically similar content...",
            SearchKind::Text => "Enter keywords to find exact matches...",
        }
    }
}

pub struct SearchForm {
    api: Arc<dyn RelayApi>,
    kind: SearchKind,
    query: String,
    results: Vec<String>,
    error: Option<String>,
    status: FormStatus,
}

impl SearchForm {
    pub fn new(api: Arc<dyn RelayApi>, kind: SearchKind) -> Self {
        Self {
            api,
            kind,
            query: String::new(),
            results: Vec::new(),
            error: None,
            status: FormStatus::Idle,
        }
    }

    pub fn api(&self) -> Arc<dyn RelayApi> {
        Arc::clone(&self.api)
    }

    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FormStatus::Loading
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        if self.is_loading() {
            return;
        }
        self.query = query.into();
        if matches!(self.status, FormStatus::Success | FormStatus::Error) {
            self.status = FormStatus::Idle;
        }
    }

    pub fn begin_submit(&mut self) -> Option<String> {
        if self.is_loading() {
            return None;
        }
        if self.query.trim().is_empty() {
            self.error = Some(EMPTY_QUERY_MESSAGE.to_string());
            self.status = FormStatus::Error;
            return None;
        }
        self.status = FormStatus::Loading;
        self.error = None;
        Some(self.query.clone())
    }

    /// The client already maps transport failures to an empty list.
    pub fn finish_submit(&mut self, results: Vec<String>) {
        self.results = results;
        if self.results.is_empty() {
            self.error = Some(NO_RESULTS_MESSAGE.to_string());
            self.status = FormStatus::Error;
        } else {
            self.status = FormStatus::Success;
        }
    }

    pub async fn submit(&mut self) {
        let Some(query) = self.begin_submit() else {
            return;
        };
        let results = run_search(self.api.as_ref(), self.kind, &query).await;
        self.finish_submit(results);
    }
}

/// Dispatch to the endpoint matching `kind` with the default limit.
pub async fn run_search(api: &dyn RelayApi, kind: SearchKind, query: &str) -> Vec<String> {
    match kind {
        SearchKind::Similarity => api.search_similar(query, DEFAULT_SEARCH_LIMIT).await,
        SearchKind::Text => api.search_by_text(query, DEFAULT_SEARCH_LIMIT).await,
    }
}
