use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ghost_typer::app::App;
use ghost_typer::config::Config;
use ghost_typer::emitter::enigo_factory;
use ghost_typer::hotkeys::{HotkeyCommand, HotkeyManager};
use ghost_typer::runtime::{AppEvent, EventHub};
use ghost_typer::session::{SessionController, SessionEnd, SessionEvent, SessionTiming};
use ghost_typer::ui;

const TICK_RATE_MS: u64 = 100;

/// Types a prepared text into whichever window has focus.
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "Types a prepared text into whichever window has focus, one character at a \
                  time at a configurable cadence. Typing is started and stopped with global \
                  hotkeys, so it works while any application is focused."
)]
struct Cli {
    /// JSON configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Preload the text buffer from a file
    #[clap(short, long)]
    text_file: Option<PathBuf>,

    /// Typing speed, 1 (slowest) to 100 (fastest)
    #[clap(short, long)]
    speed: Option<u8>,

    /// Seconds to wait before the first character (0-10)
    #[clap(short = 'd', long)]
    start_delay: Option<u64>,

    /// Hotkey that starts typing, e.g. "f9" or "ctrl+alt+t"
    #[clap(long)]
    start_hotkey: Option<String>,

    /// Hotkey that stops typing
    #[clap(long)]
    stop_hotkey: Option<String>,

    /// Type the text once without the form and exit (requires --text-file)
    #[clap(long)]
    oneshot: bool,

    /// Enable debug logging
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => {
            let path = path.to_str().context("config path is not valid UTF-8")?;
            Config::from_file(path)?
        }
        None => Config::default(),
    };

    if let Some(speed) = cli.speed {
        config.speed = speed;
    }
    if let Some(start_delay) = cli.start_delay {
        config.start_delay_secs = start_delay;
    }
    if let Some(start_hotkey) = cli.start_hotkey {
        config.start_hotkey = start_hotkey;
    }
    if let Some(stop_hotkey) = cli.stop_hotkey {
        config.stop_hotkey = stop_hotkey;
    }
    config.validate()?;

    let text = cli
        .text_file
        .as_deref()
        .map(std::fs::read_to_string)
        .transpose()
        .context("failed to read text file")?;

    let runtime = Runtime::new().context("failed to start tokio runtime")?;

    let result = if cli.oneshot {
        let text = text.context("--oneshot requires --text-file")?;
        run_oneshot(&runtime, &config, &text)
    } else {
        run_form(&runtime, &config, text)
    };

    // Bounded shutdown: a worker cancelled at quit exits within one
    // per-character delay.
    runtime.shutdown_timeout(Duration::from_secs(2));

    result
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "ghost_typer=debug" } else { "ghost_typer=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Logs go to stderr; stdout belongs to the form.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Run the interactive form until the user quits.
fn run_form(runtime: &Runtime, config: &Config, initial_text: Option<String>) -> Result<()> {
    let hub = EventHub::new(Duration::from_millis(TICK_RATE_MS));

    let session_tx = hub.sender();
    let controller = SessionController::new(
        runtime.handle().clone(),
        enigo_factory(),
        move |ev| {
            let _ = session_tx.send(AppEvent::Session(ev));
        },
    );
    let mut app = App::new(config, controller, initial_text);

    // Global hotkeys are best effort; the form still works with local keys
    // when the platform refuses the registration.
    let hotkeys = match HotkeyManager::new(&config.start_hotkey, &config.stop_hotkey) {
        Ok(manager) => {
            let manager = Arc::new(manager);
            let hotkey_tx = hub.sender();
            Arc::clone(&manager).start_listener(runtime.handle(), move |command| {
                let _ = hotkey_tx.send(AppEvent::Hotkey(command));
            });
            Some(manager)
        }
        Err(e) => {
            warn!(error = %e, "global hotkeys unavailable, local keys only");
            None
        }
    };

    hub.spawn_terminal_reader();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, &mut app, &hub);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Some(manager) = hotkeys {
        if let Err(e) = manager.unregister() {
            warn!(error = %e, "failed to unregister hotkeys");
        }
    }

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    hub: &EventHub,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(app, f))?;
        app.handle_event(hub.next());
        if app.should_quit {
            return Ok(());
        }
    }
}

/// Type the text once, reporting progress on the terminal, then exit.
fn run_oneshot(runtime: &Runtime, config: &Config, text: &str) -> Result<()> {
    let (tx, rx) = std::sync::mpsc::channel();

    let session_tx = tx.clone();
    let mut controller = SessionController::new(
        runtime.handle().clone(),
        enigo_factory(),
        move |ev| {
            let _ = session_tx.send(AppEvent::Session(ev));
        },
    );

    // The stop hotkey still works while the countdown and typing run.
    let hotkeys = match HotkeyManager::new(&config.start_hotkey, &config.stop_hotkey) {
        Ok(manager) => {
            let manager = Arc::new(manager);
            let hotkey_tx = tx.clone();
            Arc::clone(&manager).start_listener(runtime.handle(), move |command| {
                let _ = hotkey_tx.send(AppEvent::Hotkey(command));
            });
            Some(manager)
        }
        Err(e) => {
            warn!(error = %e, "global hotkeys unavailable in oneshot mode");
            None
        }
    };

    println!(
        "{} {}",
        ">".green().bold(),
        format!(
            "typing {} characters, {} to stop; focus the target window now",
            text.chars().count(),
            config.stop_hotkey.to_uppercase()
        )
        .bold()
    );

    controller.start(text, SessionTiming::from(config))?;

    let outcome = loop {
        match rx.recv().context("session channel closed")? {
            AppEvent::Session(SessionEvent::Countdown { seconds_left }) => {
                println!("{}", format!("  {}...", seconds_left).dimmed());
            }
            AppEvent::Session(SessionEvent::Started) => {
                println!("{}", "Typing in progress...".magenta());
            }
            AppEvent::Session(SessionEvent::Finished(end)) => {
                controller.reap();
                break end;
            }
            AppEvent::Hotkey(HotkeyCommand::Stop) => {
                controller.stop();
            }
            _ => {}
        }
    };

    if let Some(manager) = hotkeys {
        if let Err(e) = manager.unregister() {
            warn!(error = %e, "failed to unregister hotkeys");
        }
    }

    match outcome {
        SessionEnd::Completed { emitted } => {
            println!("{}", format!("Typed {} characters.", emitted).green());
            Ok(())
        }
        SessionEnd::Cancelled { emitted } => {
            println!("{}", format!("Stopped after {} characters.", emitted).yellow());
            Ok(())
        }
        SessionEnd::Failed { emitted, reason } => {
            println!(
                "{}",
                format!("Failed after {} characters: {}", emitted, reason).red()
            );
            anyhow::bail!("typing failed: {}", reason)
        }
    }
}
