//! ragdesk-console: Ratatui TUI add-on.
//!
//! Hosts the ragdesk-core forms in a terminal. Keyboard input is turned into
//! [`app::Command`]s that run on tokio tasks; their [`app::Outcome`]s are applied back to
//! the forms, so the draw loop never waits on the network.

pub mod app;
pub mod logging;
pub mod ui;

pub use app::{execute, Command, ConsoleApp, Outcome, StoreField, View};
