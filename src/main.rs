//! usuarios-admin binary entry point.
//!
//! Parses configuration, sets up file logging and the tokio runtime used for
//! HTTP requests, initializes the terminal in raw mode, runs the TUI event
//! loop, and restores the terminal state on exit.
//!
use std::fs::{File, OpenOptions};
use std::sync::{Mutex, mpsc};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::info;
use tracing_subscriber::EnvFilter;

use usuarios_admin::api::{Dispatcher, UsuariosClient};
use usuarios_admin::app::keymap::Keymap;
use usuarios_admin::app::{self, AppState, Theme};
use usuarios_admin::config::{AppConfig, Cli};

/// Initialize a Crossterm-backed `ratatui` terminal in raw mode.
fn init_terminal() -> Result<Terminal<CrosstermBackend<std::io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Send `tracing` output to `cfg.log_file`; `RUST_LOG` wins over `--log-level`.
fn init_logging(cfg: &AppConfig) -> Result<()> {
    let file: File = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)
        .with_context(|| format!("open log file {}", cfg.log_file.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}

/// Program entry point: run the TUI and report any top-level error to stderr.
fn main() -> Result<()> {
    let cfg = AppConfig::from_cli(Cli::parse());
    std::fs::create_dir_all(&cfg.config_dir)
        .with_context(|| format!("create config dir {}", cfg.config_dir.display()))?;
    init_logging(&cfg)?;
    info!(api_url = %cfg.api_url, "Starting usuarios-admin");

    let client = UsuariosClient::new(&cfg.api_url, cfg.timeout).context("build API client")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("build tokio runtime")?;
    let (tx, rx) = mpsc::channel();
    let dispatcher = Dispatcher::new(client, runtime.handle().clone(), tx);

    let state = AppState::new(cfg.page_size)
        .with_theme(Theme::load_or_init(&cfg.theme_path()))
        .with_keymap(Keymap::load_or_init(&cfg.keybinds_path()));

    let mut terminal = init_terminal().context("init terminal")?;

    let res = app::run(&mut terminal, state, &dispatcher, &rx);

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    // In-flight requests are abandoned; their completions have nowhere to go.
    runtime.shutdown_background();

    if let Err(err) = res {
        tracing::error!(error = %err, "Application error");
        eprintln!("application error: {err:#}");
    }
    info!("Exited");
    Ok(())
}
