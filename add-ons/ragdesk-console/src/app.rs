//! Console state and key handling. No terminal I/O here.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ragdesk_core::client::RelayError;
use ragdesk_core::forms::run_search;
use ragdesk_core::{
    DataEntryForm, GenerationForm, HealthReport, HistoryStore, RelayApi, SearchForm, SearchKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Generate,
    Store,
    SimilarSearch,
    TextSearch,
}

impl View {
    pub const ALL: [View; 4] = [
        View::Generate,
        View::Store,
        View::SimilarSearch,
        View::TextSearch,
    ];

    pub fn title(self) -> &'static str {
        match self {
            View::Generate => "F1 Generate",
            View::Store => "F2 Store",
            View::SimilarSearch => "F3 Similar",
            View::TextSearch => "F4 Text",
        }
    }

    pub fn index(self) -> usize {
        match self {
            View::Generate => 0,
            View::Store => 1,
            View::SimilarSearch => 2,
            View::TextSearch => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreField {
    Content,
    Context,
}

/// Work for the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Generate(String),
    Store { content: String, context: String },
    Search { kind: SearchKind, query: String },
    CheckHealth,
}

/// Result of a [`Command`], fed back through [`ConsoleApp::apply`].
#[derive(Debug)]
pub enum Outcome {
    Generated(Result<String, RelayError>),
    Stored(Result<String, RelayError>),
    Searched { kind: SearchKind, results: Vec<String> },
    Health(HealthReport),
}

/// Runs one command against the gateway.
pub async fn execute(api: Arc<dyn RelayApi>, command: Command) -> Outcome {
    match command {
        Command::Generate(prompt) => Outcome::Generated(api.generate_text(&prompt).await),
        Command::Store { content, context } => {
            Outcome::Stored(api.store_data(&content, &context).await)
        }
        Command::Search { kind, query } => Outcome::Searched {
            kind,
            results: run_search(api.as_ref(), kind, &query).await,
        },
        Command::CheckHealth => Outcome::Health(api.check_health().await),
    }
}

pub struct ConsoleApp {
    api: Arc<dyn RelayApi>,
    pub generation: GenerationForm,
    pub data_entry: DataEntryForm,
    pub similar: SearchForm,
    pub text: SearchForm,
    pub view: View,
    pub store_field: StoreField,
    /// Highlighted row of the history sidebar.
    pub history_cursor: usize,
    pub health: Option<HealthReport>,
    /// One-line status for problems outside the forms (e.g. history writes).
    pub notice: Option<String>,
    pub should_quit: bool,
}

impl ConsoleApp {
    pub fn new(api: Arc<dyn RelayApi>, store: Arc<dyn HistoryStore>) -> Self {
        Self {
            generation: GenerationForm::new(Arc::clone(&api), store),
            data_entry: DataEntryForm::new(Arc::clone(&api)),
            similar: SearchForm::new(Arc::clone(&api), SearchKind::Similarity),
            text: SearchForm::new(Arc::clone(&api), SearchKind::Text),
            api,
            view: View::Generate,
            store_field: StoreField::Content,
            history_cursor: 0,
            health: None,
            notice: None,
            should_quit: false,
        }
    }

    pub fn api(&self) -> Arc<dyn RelayApi> {
        Arc::clone(&self.api)
    }

    pub fn is_busy(&self) -> bool {
        self.generation.is_loading()
            || self.data_entry.is_loading()
            || self.similar.is_loading()
            || self.text.is_loading()
    }

    fn search_form(&mut self, kind: SearchKind) -> &mut SearchForm {
        match kind {
            SearchKind::Similarity => &mut self.similar,
            SearchKind::Text => &mut self.text,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => {
                self.should_quit = true;
                return None;
            }
            KeyCode::Char('c') if ctrl => {
                self.should_quit = true;
                return None;
            }
            KeyCode::F(1) => self.view = View::Generate,
            KeyCode::F(2) => self.view = View::Store,
            KeyCode::F(3) => self.view = View::SimilarSearch,
            KeyCode::F(4) => self.view = View::TextSearch,
            KeyCode::F(5) => return Some(Command::CheckHealth),
            _ => {
                return match self.view {
                    View::Generate => self.generate_key(key.code, ctrl),
                    View::Store => self.store_key(key.code),
                    View::SimilarSearch => self.search_key(SearchKind::Similarity, key.code),
                    View::TextSearch => self.search_key(SearchKind::Text, key.code),
                }
            }
        }
        None
    }

    fn generate_key(&mut self, code: KeyCode, ctrl: bool) -> Option<Command> {
        let history_len = self.generation.history().len();
        match code {
            KeyCode::Enter => return self.generation.begin_submit().map(Command::Generate),
            KeyCode::Up => self.history_cursor = self.history_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.history_cursor + 1 < history_len {
                    self.history_cursor += 1;
                }
            }
            KeyCode::Char('r') if ctrl => {
                if let Some(id) = self.cursor_id() {
                    self.generation.replay(&id);
                }
            }
            KeyCode::Char('d') if ctrl => {
                if let Some(id) = self.cursor_id() {
                    if let Err(e) = self.generation.delete_history_item(&id) {
                        tracing::error!("Deleting history item failed: {}", e);
                        self.notice = Some(format!("History not saved: {}", e));
                    }
                    self.clamp_cursor();
                }
            }
            KeyCode::Char('l') if ctrl => {
                if let Err(e) = self.generation.clear_history() {
                    tracing::error!("Clearing history failed: {}", e);
                    self.notice = Some(format!("History not cleared: {}", e));
                }
                self.history_cursor = 0;
            }
            KeyCode::Char(c) if !ctrl => {
                let mut prompt = self.generation.prompt().to_string();
                prompt.push(c);
                self.generation.set_prompt(prompt);
            }
            KeyCode::Backspace => {
                let mut prompt = self.generation.prompt().to_string();
                prompt.pop();
                self.generation.set_prompt(prompt);
            }
            _ => {}
        }
        None
    }

    fn store_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Enter => {
                return self
                    .data_entry
                    .begin_submit()
                    .map(|(content, context)| Command::Store { content, context })
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.store_field = match self.store_field {
                    StoreField::Content => StoreField::Context,
                    StoreField::Context => StoreField::Content,
                }
            }
            KeyCode::Char(c) => self.edit_store_field(|s| s.push(c)),
            KeyCode::Backspace => self.edit_store_field(|s| {
                s.pop();
            }),
            _ => {}
        }
        None
    }

    fn edit_store_field(&mut self, edit: impl FnOnce(&mut String)) {
        match self.store_field {
            StoreField::Content => {
                let mut value = self.data_entry.content().to_string();
                edit(&mut value);
                self.data_entry.set_content(value);
            }
            StoreField::Context => {
                let mut value = self.data_entry.context().to_string();
                edit(&mut value);
                self.data_entry.set_context(value);
            }
        }
    }

    fn search_key(&mut self, kind: SearchKind, code: KeyCode) -> Option<Command> {
        let form = self.search_form(kind);
        match code {
            KeyCode::Enter => {
                return form
                    .begin_submit()
                    .map(|query| Command::Search { kind, query })
            }
            KeyCode::Char(c) => {
                let mut query = form.query().to_string();
                query.push(c);
                form.set_query(query);
            }
            KeyCode::Backspace => {
                let mut query = form.query().to_string();
                query.pop();
                form.set_query(query);
            }
            _ => {}
        }
        None
    }

    fn cursor_id(&self) -> Option<String> {
        self.generation
            .history()
            .get(self.history_cursor)
            .map(|item| item.id.clone())
    }

    fn clamp_cursor(&mut self) {
        let len = self.generation.history().len();
        if self.history_cursor >= len {
            self.history_cursor = len.saturating_sub(1);
        }
    }

    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Generated(result) => {
                self.generation.finish_submit(result);
                self.history_cursor = 0;
            }
            Outcome::Stored(result) => self.data_entry.finish_submit(result),
            Outcome::Searched { kind, results } => self.search_form(kind).finish_submit(results),
            Outcome::Health(report) => self.health = Some(report),
        }
    }
}
