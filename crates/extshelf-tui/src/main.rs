//! extshelf - browse, filter and prune a list of browser extensions from the
//! terminal, with the site's assets kept available offline.

mod app;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use extshelf_core::{Config, Runtime};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name, in the cache directory
const LOG_FILE: &str = "extshelf.log";

fn env_filter() -> EnvFilter {
    // RUST_LOG controls the level (e.g., RUST_LOG=extshelf_core=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to a file; the terminal belongs to the UI.
fn init_tracing(log_dir: PathBuf) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, LOG_FILE));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Ok(guard)
}

fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let dump_html = args.iter().any(|a| a == "--dump-html");
    let online = !args.iter().any(|a| a == "--offline");

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let config = config.with_env_overrides();

    let _guard = if dump_html {
        init_stderr_tracing();
        None
    } else {
        let log_dir = config.cache_dir().unwrap_or_else(|_| PathBuf::from("./cache"));
        Some(init_tracing(log_dir)?)
    };

    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    if dump_html {
        return dump_document(&config, online).await;
    }

    info!(base_url = %config.base_url, online, "extshelf starting");
    let runtime = Runtime::start(&config, online).await?;
    let mut app = App::new(runtime);
    app.mount();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.shutdown().await?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("extshelf shutting down");
    Ok(())
}

/// Mount the page once and print the resulting document markup
async fn dump_document(config: &Config, online: bool) -> Result<()> {
    let mut runtime = Runtime::start(config, online).await?;
    runtime.page_mut().mount().await;
    print!("{}", runtime.page().document().to_html());
    runtime.shutdown().await;
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, app))?;

        // Poll with a timeout so background results show up promptly
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }
                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
