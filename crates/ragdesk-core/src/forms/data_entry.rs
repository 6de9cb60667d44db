//! Store-new-data form.

use std::sync::Arc;

use super::FormStatus;
use crate::client::{RelayApi, RelayError};

pub const EMPTY_CONTENT_MESSAGE: &str = "Content cannot be empty";
pub const STORE_FAILED_MESSAGE: &str = "Failed to store data. Please try again.";

pub struct DataEntryForm {
    api: Arc<dyn RelayApi>,
    content: String,
    context: String,
    result_id: Option<String>,
    error: Option<String>,
    status: FormStatus,
}

impl DataEntryForm {
    pub fn new(api: Arc<dyn RelayApi>) -> Self {
        Self {
            api,
            content: String::new(),
            context: String::new(),
            result_id: None,
            error: None,
            status: FormStatus::Idle,
        }
    }

    pub fn api(&self) -> Arc<dyn RelayApi> {
        Arc::clone(&self.api)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    /// Id of the last stored document.
    pub fn result_id(&self) -> Option<&str> {
        self.result_id.as_deref()
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

    pub fn set_content(&mut self, content: impl Into<String>) {
        if !self.is_loading() {
            self.content = content.into();
            self.settle();
        }
    }

    pub fn set_context(&mut self, context: impl Into<String>) {
        if !self.is_loading() {
            self.context = context.into();
            self.settle();
        }
    }

    fn settle(&mut self) {
        if matches!(self.status, FormStatus::Success | FormStatus::Error) {
            self.status = FormStatus::Idle;
        }
    }

    /// Returns `(content, context)` to send, or `None` if blank or already loading.
    pub fn begin_submit(&mut self) -> Option<(String, String)> {
        if self.is_loading() {
            return None;
        }
        if self.content.trim().is_empty() {
            self.error = Some(EMPTY_CONTENT_MESSAGE.to_string());
            self.status = FormStatus::Error;
            return None;
        }
        self.status = FormStatus::Loading;
        self.error = None;
        Some((self.content.clone(), self.context.clone()))
    }

    pub fn finish_submit(&mut self, result: Result<String, RelayError>) {
        match result {
            Ok(id) => {
                self.result_id = Some(id);
                self.content.clear();
                self.context.clear();
                self.status = FormStatus::Success;
            }
            Err(e) => {
                tracing::error!("Storing data failed: {}", e);
                self.error = Some(STORE_FAILED_MESSAGE.to_string());
                self.status = FormStatus::Error;
            }
        }
    }

    pub async fn submit(&mut self) {
        let Some((content, context)) = self.begin_submit() else {
            return;
        };
        let result = self.api.store_data(&content, &context).await;
        self.finish_submit(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::testing::FakeApi;

    #[tokio::test]
    async fn blank_content_is_rejected_locally() {
        let api = Arc::new(FakeApi::ok());
        let mut form = DataEntryForm::new(api.clone());
        form.set_context("only context");
        form.submit().await;

        assert_eq!(api.call_count(), 0);
        assert_eq!(form.error(), Some(EMPTY_CONTENT_MESSAGE));
        assert_eq!(form.context(), "only context");
    }

    #[tokio::test]
    async fn success_clears_fields_and_keeps_id() {
        let api = Arc::new(FakeApi::ok());
        let mut form = DataEntryForm::new(api.clone());
        form.set_content("hello");
        form.set_context("ctx");
        form.submit().await;

        assert_eq!(form.status(), FormStatus::Success);
        assert_eq!(form.result_id(), Some("id-5"));
        assert_eq!(form.content(), "");
        assert_eq!(form.context(), "");
    }

    #[tokio::test]
    async fn failure_keeps_fields() {
        let api = Arc::new(FakeApi::failing());
        let mut form = DataEntryForm::new(api.clone());
        form.set_content("hello");
        form.submit().await;

        assert_eq!(form.status(), FormStatus::Error);
        assert_eq!(form.error(), Some(STORE_FAILED_MESSAGE));
        assert_eq!(form.content(), "hello");
        assert!(form.result_id().is_none());
    }
}
