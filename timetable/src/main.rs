//! `timetable`: a terminal weekly study planner.
//!
//! Sign in or create an account, file tasks under weekdays, tick them off
//! and export the week as a PDF. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/timetable/config.toml`).
//!
//! ```bash
//! cargo run --bin timetable
//!
//! # Start on Friday and export next to the config
//! cargo run --bin timetable -- --day friday --output-dir ~/Documents
//!
//! # Use a specific converter for exports
//! TIMETABLE_RENDERER=/opt/bin/wkhtmltopdf cargo run
//! ```

use std::io;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseButton,
        MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Position, Rect},
};
use tracing_appender::non_blocking::WorkerGuard;

use timetable::app::{Action, App};
use timetable::auth::AuthProvider;
use timetable::auth::memory::MemoryAuth;
use timetable::board::TaskBoard;
use timetable::config::{CliArgs, ClientConfig};
use timetable::export::command::CommandRenderer;
use timetable::modal::Dismissal;
use timetable::session::{SessionManager, View};
use timetable::store::memory::MemoryStore;
use timetable::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // CLI args > env > config file > defaults.
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    // Logs go to a file; ratatui owns stdout.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!("timetable starting");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("timetable exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("timetable.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &ClientConfig,
) -> io::Result<()> {
    let auth = Arc::new(MemoryAuth::with_config(config.memory_auth_config()));
    let store = Arc::new(MemoryStore::new());
    let renderer = match CommandRenderer::detect(&config.renderer_program) {
        Ok(r) => Some(r),
        Err(e) => {
            tracing::warn!(error = %e, "pdf export disabled");
            None
        }
    };

    let session = SessionManager::new(Arc::clone(&auth), config.session_config(), View::Login);
    let board = TaskBoard::new(store, renderer, auth.identity(), config.board_config());
    let mut app = App::new(session, board, auth.identity(), config.notice_timeout);

    loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Identity first, so events from a stale subscription are dropped.
        app.sync_identity();
        app.drain_events();
        app.tick();

        if !event::poll(config.poll_timeout)? {
            continue;
        }
        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => app.handle_key_event(key),
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                outside_click(terminal, &app, Position::new(mouse.column, mouse.row))?
            }
            _ => None,
        };
        if let Some(action) = action {
            app.perform(action).await;
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// A left click outside the open confirmation dismisses it.
fn outside_click(
    terminal: &Terminal<CrosstermBackend<io::Stdout>>,
    app: &App<MemoryAuth, MemoryStore, CommandRenderer>,
    at: Position,
) -> io::Result<Option<Action>> {
    if !app.board_visible() || !app.board().modal().is_open() {
        return Ok(None);
    }
    let size = terminal.size()?;
    // Content area is everything above the one-line status bar.
    let content = Rect::new(0, 0, size.width, size.height.saturating_sub(1));
    let popup = ui::confirm::popup_area(content);
    Ok((!popup.contains(at)).then_some(Action::Dismiss(Dismissal::OutsideClick)))
}
