//! typesprint - a terminal typing-speed test.
//!
//! Texts come from the typesprint backend; finished tests are saved to the
//! signed-in user's history. The session token survives restarts and is
//! verified against the backend on startup.

mod app;
mod nav;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use typesprint_core::{ApiClient, AuthSession, Config};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Daily log file name prefix in the cache directory
const LOG_FILE_PREFIX: &str = "typesprint.log";

/// Initialize file logging. The terminal belongs to the UI, so nothing is
/// written to stdout/stderr. Use RUST_LOG to control the level.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config.cache_dir().ok()?.join("logs");
    std::fs::create_dir_all(&log_dir).ok()?;

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config ({e}), using defaults");
            Config::default()
        }
    };

    let _log_guard = init_tracing(&config);
    info!(version = env!("CARGO_PKG_VERSION"), "typesprint starting");

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--login" {
        return login_from_cli(config, args.get(2).cloned()).await;
    }
    if args.len() > 1 && args[1] == "--register" {
        return register_from_cli(config, args.get(2).cloned()).await;
    }
    if args.len() > 1 && args[1] == "--logout" {
        return logout_from_cli(config).await;
    }

    // Create app before touching the terminal so setup errors print normally
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("typesprint shutting down");
    Ok(())
}

/// Log in without opening the TUI; the token is stored for the next run.
async fn login_from_cli(mut config: Config, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", username))?;

    let api = ApiClient::new(config.backend_url())?;
    let mut session = AuthSession::new(config.token_store()?, api);
    let user = session
        .login_with_password(&username, &password)
        .await
        .map_err(|e| anyhow::anyhow!(app::login_error_message(&e)))?;

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Logged in as {}", user.display_name());
    Ok(())
}

/// Create an account without opening the TUI; the new session's token is
/// stored for the next run.
async fn register_from_cli(mut config: Config, username: Option<String>) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt("Username: ")?,
    };
    let email = prompt("Email: ")?;
    let password = rpassword::prompt_password("Password: ")?;
    let confirm = rpassword::prompt_password("Confirm password: ")?;
    if password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    let api = ApiClient::new(config.backend_url())?;
    let mut session = AuthSession::new(config.token_store()?, api);
    let user = session
        .register(&username, &email, &password)
        .await
        .map_err(|e| anyhow::anyhow!(app::register_error_message(&e)))?;

    config.last_username = Some(username);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    println!("Registered and logged in as {}", user.display_name());
    Ok(())
}

/// Revoke and forget the stored token.
async fn logout_from_cli(config: Config) -> Result<()> {
    let api = ApiClient::new(config.backend_url())?;
    let mut session = AuthSession::new(config.token_store()?, api);
    session.initialize().await;
    session.logout().await;
    println!("Logged out");
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .with_context(|| format!("Failed to read {}", label.trim_end_matches(": ").to_lowercase()))?;
    Ok(line.trim().to_string())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout so the timer and background work advance
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    // Ctrl+C to quit
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        return Ok(());
                    }

                    if handle_input(app, key).await? {
                        return Ok(());
                    }
                }
            }
        }

        app.maybe_tick().await;

        // Check for completed background tasks and auth changes
        app.check_background_tasks().await?;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
