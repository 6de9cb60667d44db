//! ragdesk-core: shared library for the ragdesk gateway and console.
//!
//! Holds the pieces both sides need: layered configuration, the bounded generation
//! history, the backend relay with its mock fallbacks, the client for the gateway's
//! proxy surface, and the form controllers the console drives.

pub mod backend;
pub mod client;
pub mod config;
pub mod fallback;
pub mod forms;
pub mod history;

pub use backend::{BackendEndpoint, BackendError, BackendRelay};
pub use client::{iso_now, HealthReport, RelayApi, RelayClient, RelayError};
pub use config::RagdeskConfig;
pub use forms::{DataEntryForm, FormStatus, GenerationForm, SearchForm, SearchKind};
pub use history::{
    HistoryError, HistoryItem, HistorySlot, HistoryStore, MemorySlot, SledSlot, SlotHistory,
    HISTORY_KEY, HISTORY_LIMIT,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
