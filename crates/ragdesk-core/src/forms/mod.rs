//! Form controllers: input state, client-side validation and the request lifecycle.
//!
//! Each form follows `Idle -> Loading -> Success | Error -> Idle`. Submission is split in
//! two so a host can run the request off its input loop: `begin_submit` validates and
//! enters `Loading` (returning what to send), `finish_submit` applies the outcome. While a
//! form is `Loading`, `begin_submit` refuses, which is the only guard against double
//! submission.

mod data_entry;
mod generation;
mod search;

pub use data_entry::DataEntryForm;
pub use generation::GenerationForm;
pub use search::{run_search, SearchForm, SearchKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::client::{HealthReport, RelayApi, RelayError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted [`RelayApi`] that counts calls.
    #[derive(Default)]
    pub struct FakeApi {
        pub calls: AtomicUsize,
        pub fail: bool,
        pub results: Vec<String>,
        pub last_limit: Mutex<Option<usize>>,
    }

    impl FakeApi {
        pub fn ok() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn with_results(results: &[&str]) -> Self {
            Self {
                results: results.iter().map(|s| s.to_string()).collect(),
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn error() -> RelayError {
            RelayError::Status {
                status: 500,
                body: "boom".to_string(),
            }
        }
    }

    #[async_trait::async_trait]
    impl RelayApi for FakeApi {
        async fn check_health(&self) -> HealthReport {
            self.calls.fetch_add(1, Ordering::SeqCst);
            HealthReport::unreachable("http://fake")
        }

        async fn store_data(&self, content: &str, _context: &str) -> Result<String, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Self::error());
            }
            Ok(format!("id-{}", content.len()))
        }

        async fn search_similar(&self, _query: &str, limit: usize) -> Vec<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_limit.lock().unwrap() = Some(limit);
            self.results.clone()
        }

        async fn search_by_text(&self, query: &str, limit: usize) -> Vec<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_limit.lock().unwrap() = Some(limit);
            self.results.iter().map(|r| format!("{} ({})", r, query)).collect()
        }

        async fn generate_text(&self, prompt: &str) -> Result<String, RelayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Self::error());
            }
            Ok(format!("generated for {}", prompt))
        }
    }
}
