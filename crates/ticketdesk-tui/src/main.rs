//! ticketdesk - a terminal client for the ticket system.
//!
//! Sign in, register, reset a password and browse a role-aware dashboard
//! from the terminal. The session token survives restarts.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ticketdesk_core::{Config, Route, SessionStatus};

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "ticketdesk.log";

const USAGE: &str = "\
Usage: ticketdesk [COMMAND]

Without a command, starts the terminal UI.

Commands:
  --login                Sign in from the command line
  --logout               Forget the saved session
  --whoami               Print the signed-in user as JSON
  --reset-token <TOKEN>  Open the password reset form for a reset link token
  --help                 Show this message";

/// What the binary was asked to do
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// Start the terminal UI on this view
    Tui(Route),
    Login,
    Logout,
    WhoAmI,
    Help,
}

/// Parse the arguments after the program name.
fn parse_command(args: &[String]) -> Result<Command> {
    Ok(match args.first().map(String::as_str) {
        None => Command::Tui(Route::Login),
        Some("--login") => Command::Login,
        Some("--logout") => Command::Logout,
        Some("--whoami") => Command::WhoAmI,
        Some("--reset-token") => Command::Tui(Route::ResetPassword {
            token: args.get(1).cloned(),
        }),
        Some("--help") | Some("-h") => Command::Help,
        Some(other) => anyhow::bail!("Unknown argument: {}\n\n{}", other, USAGE),
    })
}

/// Initialize the tracing subscriber, writing to a log file so the
/// terminal UI stays clean. RUST_LOG controls the level (default: warn).
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let _log_guard = init_tracing(&config.data_dir()?.join("logs"))?;

    let start = match parse_command(&std::env::args().skip(1).collect::<Vec<_>>())? {
        Command::Tui(route) => route,
        Command::Login => return cli_login(config).await,
        Command::Logout => return cli_logout(config),
        Command::WhoAmI => return cli_whoami(config).await,
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    info!(api_url = %config.api_url(), "ticketdesk starting");

    // Create app before touching the terminal so config errors print normally
    let mut app = App::new(config, start)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Show the loading view while the saved session is checked
    let result = match terminal.draw(|f| render(f, &app)) {
        Ok(_) => match restore_session(&mut app).await {
            Ok(true) => run_app(&mut terminal, &mut app).await,
            Ok(false) => Ok(()),
            Err(e) => Err(e),
        },
        Err(e) => Err(e.into()),
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("ticketdesk shutting down");
    Ok(())
}

/// Line-mode login; the token is saved for the next TUI start
async fn cli_login(config: Config) -> Result<()> {
    let mut app = App::new(config, Route::Login)?;
    app.login_interactive().await
}

fn cli_logout(config: Config) -> Result<()> {
    let mut app = App::new(config, Route::Login)?;
    app.logout();
    println!("Logged out.");
    Ok(())
}

/// Restore the saved session and print who it belongs to
async fn cli_whoami(config: Config) -> Result<()> {
    let mut app = App::new(config, Route::Login)?;
    match app.auth.initialize().await {
        SessionStatus::Authenticated(user) => {
            println!("{}", serde_json::to_string_pretty(user)?);
            Ok(())
        }
        _ => anyhow::bail!("Not logged in. Run `ticketdesk --login` first."),
    }
}

fn is_quit_key(key: KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

/// Resolve the saved session while still reading the keyboard, so Esc or
/// Ctrl+C can abandon a slow restore. Returns false if the user quit.
async fn restore_session(app: &mut App) -> Result<bool> {
    let restore = app.initialize();
    tokio::pin!(restore);

    loop {
        tokio::select! {
            () = &mut restore => return Ok(true),
            () = tokio::time::sleep(Duration::from_millis(EVENT_POLL_TIMEOUT_MS)) => {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        if is_quit_key(key) {
                            info!("Quit while restoring session");
                            return Ok(false);
                        }
                    }
                }
            }
        }
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow timed redirects
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        app.tick();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
