//! ragdesk-console: TUI with Ratatui. Keyboard-driven front end for the ragdesk gateway.
//! Logs go to `./data/logs/ragdesk-console.log` because the terminal is taken by the UI;
//! if that directory is unusable the console runs without file logging.

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ragdesk_console::{execute as run_command, logging, ui, Command, ConsoleApp, Outcome};
use ragdesk_core::{HistoryStore, MemorySlot, RagdeskConfig, RelayClient, SledSlot, SlotHistory};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let _guard = logging::init(logging::LOG_DIR);

    let config = RagdeskConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Config not loaded ({}); using defaults", e);
        RagdeskConfig::default()
    });

    let mut notice = None;
    let store: Arc<dyn HistoryStore> = match SledSlot::open(Some(&config.history_path)) {
        Ok(slot) => Arc::new(SlotHistory::new(slot)),
        Err(e) => {
            tracing::error!("History slot at {} unavailable: {}", config.history_path, e);
            notice = Some("History is not persisted this session".to_string());
            Arc::new(SlotHistory::new(MemorySlot::new()))
        }
    };
    let api = Arc::new(RelayClient::new(&config.gateway_url, &config.backend_url));

    let mut app = ConsoleApp::new(api, store);
    app.notice = notice;

    let runtime = tokio::runtime::Runtime::new()?;
    let (tx, rx) = mpsc::unbounded_channel::<Outcome>();
    tracing::info!("ragdesk console started against {}", config.gateway_url);

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;

    let result = run(&mut terminal, &mut app, &runtime, tx, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut ConsoleApp,
    runtime: &tokio::runtime::Runtime,
    tx: mpsc::UnboundedSender<Outcome>,
    mut rx: mpsc::UnboundedReceiver<Outcome>,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = app.api();
    let dispatch = |command: Command| {
        let api = Arc::clone(&api);
        let tx = tx.clone();
        runtime.spawn(async move {
            let _ = tx.send(run_command(api, command).await);
        });
    };
    dispatch(Command::CheckHealth);

    while !app.should_quit {
        while let Ok(outcome) = rx.try_recv() {
            app.apply(outcome);
        }

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if let Some(command) = app.handle_key(key) {
                    dispatch(command);
                }
            }
        }
    }
    Ok(())
}
