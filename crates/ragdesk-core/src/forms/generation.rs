//! Text generation form with its history sidebar.

use std::sync::Arc;

use super::FormStatus;
use crate::client::{RelayApi, RelayError};
use crate::history::{HistoryError, HistoryItem, HistoryStore};

pub const EMPTY_PROMPT_MESSAGE: &str = "Prompt cannot be empty";
pub const GENERATE_FAILED_MESSAGE: &str = "Failed to generate text. Please try again.";

pub struct GenerationForm {
    api: Arc<dyn RelayApi>,
    store: Arc<dyn HistoryStore>,
    prompt: String,
    generated_text: Option<String>,
    error: Option<String>,
    status: FormStatus,
    history: Vec<HistoryItem>,
    selected: Option<String>,
    in_flight: Option<String>,
}

impl GenerationForm {
    /// Builds the form and loads the persisted history.
    pub fn new(api: Arc<dyn RelayApi>, store: Arc<dyn HistoryStore>) -> Self {
        let history = store.load();
        Self {
            api,
            store,
            prompt: String::new(),
            generated_text: None,
            error: None,
            status: FormStatus::Idle,
            history,
            selected: None,
            in_flight: None,
        }
    }

    pub fn api(&self) -> Arc<dyn RelayApi> {
        Arc::clone(&self.api)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn generated_text(&self) -> Option<&str> {
        self.generated_text.as_deref()
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

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Whether the submit control is enabled.
    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.prompt.trim().is_empty()
    }

    /// Ignored while loading (the input is disabled). Editing after a finished request
    /// returns the form to `Idle`.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        if self.is_loading() {
            return;
        }
        self.prompt = prompt.into();
        if matches!(self.status, FormStatus::Success | FormStatus::Error) {
            self.status = FormStatus::Idle;
        }
    }

    /// Validate and enter `Loading`. Returns the prompt to send, or `None` when the prompt
    /// is blank (an inline error is set) or a request is already in flight.
    pub fn begin_submit(&mut self) -> Option<String> {
        if self.is_loading() {
            return None;
        }
        if self.prompt.trim().is_empty() {
            self.error = Some(EMPTY_PROMPT_MESSAGE.to_string());
            self.status = FormStatus::Error;
            return None;
        }
        self.status = FormStatus::Loading;
        self.error = None;
        self.generated_text = None;
        self.in_flight = Some(self.prompt.clone());
        Some(self.prompt.clone())
    }

    /// Apply the outcome of the request started by [`GenerationForm::begin_submit`].
    pub fn finish_submit(&mut self, result: Result<String, RelayError>) {
        let submitted = self
            .in_flight
            .take()
            .unwrap_or_else(|| self.prompt.clone());
        match result {
            Ok(text) => {
                self.generated_text = Some(text.clone());
                let item = HistoryItem::new(submitted.trim(), text);
                match self.store.append(item) {
                    Ok(items) => self.history = items,
                    Err(e) => {
                        tracing::error!("Error saving history: {}", e);
                        self.history = self.store.load();
                    }
                }
                self.prompt.clear();
                self.status = FormStatus::Success;
            }
            Err(e) => {
                tracing::error!("Generation failed: {}", e);
                self.error = Some(GENERATE_FAILED_MESSAGE.to_string());
                self.status = FormStatus::Error;
            }
        }
    }

    /// Full round trip on the current task.
    pub async fn submit(&mut self) {
        let Some(prompt) = self.begin_submit() else {
            return;
        };
        let result = self.api.generate_text(&prompt).await;
        self.finish_submit(result);
    }

    /// Show a stored generation again without calling the backend.
    pub fn replay(&mut self, id: &str) -> bool {
        if self.is_loading() {
            return false;
        }
        let Some(item) = self.history.iter().find(|item| item.id == id) else {
            return false;
        };
        self.prompt = item.prompt.clone();
        self.generated_text = Some(item.response.clone());
        self.selected = Some(item.id.clone());
        self.status = FormStatus::Idle;
        true
    }

    pub fn delete_history_item(&mut self, id: &str) -> Result<(), HistoryError> {
        self.history = self.store.remove(id)?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    pub fn clear_history(&mut self) -> Result<(), HistoryError> {
        self.history.clear();
        self.selected = None;
        self.store.clear()
    }

    pub fn reload_history(&mut self) {
        self.history = self.store.load();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::testing::FakeApi;
    use crate::history::{MemorySlot, SlotHistory, HISTORY_LIMIT};

    fn form_with(api: FakeApi) -> (GenerationForm, Arc<FakeApi>, Arc<SlotHistory<MemorySlot>>) {
        let api = Arc::new(api);
        let store = Arc::new(SlotHistory::new(MemorySlot::new()));
        let form = GenerationForm::new(api.clone(), store.clone());
        (form, api, store)
    }

    #[tokio::test]
    async fn blank_prompt_never_calls_backend() {
        let (mut form, api, _) = form_with(FakeApi::ok());
        form.set_prompt("   \n ");
        assert!(!form.can_submit());
        form.submit().await;

        assert_eq!(api.call_count(), 0);
        assert_eq!(form.error(), Some(EMPTY_PROMPT_MESSAGE));
        assert_eq!(form.status(), FormStatus::Error);
    }

    #[tokio::test]
    async fn success_records_history_and_clears_prompt() {
        let (mut form, api, store) = form_with(FakeApi::ok());
        form.set_prompt("  hello  ");
        form.submit().await;

        assert_eq!(api.call_count(), 1);
        assert_eq!(form.status(), FormStatus::Success);
        assert_eq!(form.generated_text(), Some("generated for   hello  "));
        assert_eq!(form.prompt(), "");
        assert!(form.error().is_none());

        let persisted = store.load();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].prompt, "hello");
        assert_eq!(form.history(), persisted.as_slice());
    }

    #[tokio::test]
    async fn failure_keeps_prompt_and_sets_message() {
        let (mut form, api, store) = form_with(FakeApi::failing());
        form.set_prompt("hello");
        form.submit().await;

        assert_eq!(api.call_count(), 1);
        assert_eq!(form.status(), FormStatus::Error);
        assert_eq!(form.error(), Some(GENERATE_FAILED_MESSAGE));
        assert_eq!(form.prompt(), "hello");
        assert!(form.generated_text().is_none());
        assert!(store.load().is_empty());
    }

    #[test]
    fn loading_blocks_second_submission_and_edits() {
        let (mut form, _, _) = form_with(FakeApi::ok());
        form.set_prompt("first");
        assert_eq!(form.begin_submit().as_deref(), Some("first"));
        assert!(form.is_loading());
        assert!(!form.can_submit());

        form.set_prompt("second");
        assert_eq!(form.prompt(), "first");
        assert!(form.begin_submit().is_none());

        form.finish_submit(Ok("done".to_string()));
        assert_eq!(form.status(), FormStatus::Success);
        assert_eq!(form.history()[0].prompt, "first");

        form.set_prompt("next");
        assert_eq!(form.status(), FormStatus::Idle);
    }

    #[tokio::test]
    async fn history_is_capped_through_the_form() {
        let (mut form, _, store) = form_with(FakeApi::ok());
        for n in 0..(HISTORY_LIMIT + 3) {
            form.set_prompt(format!("p{}", n));
            form.submit().await;
        }
        assert_eq!(form.history().len(), HISTORY_LIMIT);
        assert_eq!(form.history()[0].prompt, format!("p{}", HISTORY_LIMIT + 2));
        assert_eq!(store.load().len(), HISTORY_LIMIT);
    }

    #[tokio::test]
    async fn replay_restores_prompt_and_response_without_calls() {
        let (mut form, api, _) = form_with(FakeApi::ok());
        form.set_prompt("remember me");
        form.submit().await;
        let id = form.history()[0].id.clone();

        assert!(form.replay(&id));
        assert_eq!(api.call_count(), 1);
        assert_eq!(form.prompt(), "remember me");
        assert_eq!(form.generated_text(), Some("generated for remember me"));
        assert_eq!(form.selected(), Some(id.as_str()));
        assert!(!form.replay("gen_unknown"));
    }

    #[tokio::test]
    async fn delete_and_clear_reset_selection() {
        let (mut form, _, store) = form_with(FakeApi::ok());
        for p in ["a", "b", "c"] {
            form.set_prompt(p);
            form.submit().await;
        }
        let selected = form.history()[1].id.clone();
        form.replay(&selected);

        form.delete_history_item("gen_missing").unwrap();
        assert_eq!(form.history().len(), 3);
        assert_eq!(form.selected(), Some(selected.as_str()));

        form.delete_history_item(&selected).unwrap();
        assert_eq!(form.history().len(), 2);
        assert!(form.selected().is_none());
        assert_eq!(store.load().len(), 2);

        let first = form.history()[0].id.clone();
        form.replay(&first);
        form.clear_history().unwrap();
        assert!(form.history().is_empty());
        assert!(form.selected().is_none());
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupted_history_loads_empty() {
        let store = Arc::new(SlotHistory::new(MemorySlot::with_contents("[{broken")));
        let form = GenerationForm::new(Arc::new(FakeApi::ok()), store);
        assert!(form.history().is_empty());
    }
}
