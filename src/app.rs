//! Form state and its reaction to keys, hotkeys and session events.
//!
//! The form owns the text buffer, the speed and start-delay controls and
//! the status line, and is the only place sessions are started or stopped.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::config::{delay_for_speed, Config, SPEED_MAX, SPEED_MIN, START_DELAY_MAX_SECS};
use crate::hotkeys::HotkeyCommand;
use crate::runtime::AppEvent;
use crate::session::{SessionController, SessionEnd, SessionEvent, SessionTiming};
use crate::TyperError;

/// Which control receives plain key input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
    Text,
    Speed,
    Delay,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Text => Focus::Speed,
            Focus::Speed => Focus::Delay,
            Focus::Delay => Focus::Text,
        }
    }
}

/// Status line severity, drives its color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Warning,
    Active,
    Done,
    Error,
}

/// The single status line; overwritten on every change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub message: String,
}

impl Status {
    fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Display phase mirrored from session events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Countdown { seconds_left: u64 },
    Typing { emitted: usize, total: usize },
}

/// The form: all user-visible state plus the session controller.
pub struct App {
    pub text: String,
    pub speed: u8,
    pub start_delay_secs: u64,
    pub focus: Focus,
    pub status: Status,
    pub phase: Phase,
    pub should_quit: bool,
    pub start_hotkey: String,
    pub stop_hotkey: String,
    char_delay_override: Option<Duration>,
    controller: SessionController,
}

impl App {
    pub fn new(config: &Config, controller: SessionController, initial_text: Option<String>) -> Self {
        Self {
            text: initial_text.unwrap_or_default(),
            speed: config.speed,
            start_delay_secs: config.start_delay_secs,
            focus: Focus::Text,
            status: Status::new(StatusKind::Info, "Enter text to type."),
            phase: Phase::Idle,
            should_quit: false,
            start_hotkey: config.start_hotkey.clone(),
            stop_hotkey: config.stop_hotkey.clone(),
            char_delay_override: config.char_delay,
            controller,
        }
    }

    /// The per-character delay a session started now would use.
    pub fn char_delay(&self) -> Duration {
        self.char_delay_override
            .unwrap_or_else(|| delay_for_speed(self.speed))
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Hotkey(HotkeyCommand::Start) => self.start_typing(),
            AppEvent::Hotkey(HotkeyCommand::Stop) => self.stop_typing(),
            AppEvent::Session(ev) => self.on_session_event(ev),
            AppEvent::Tick | AppEvent::Resize => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }

        match key.code {
            KeyCode::Esc => {
                self.quit();
                return;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit();
                return;
            }
            // Local fallbacks for the default bindings, in case global
            // registration was refused by the platform.
            KeyCode::F(9) => {
                self.start_typing();
                return;
            }
            KeyCode::F(10) => {
                self.stop_typing();
                return;
            }
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return;
            }
            _ => {}
        }

        match self.focus {
            Focus::Text => self.edit_text(key),
            Focus::Speed => self.adjust_speed(key.code),
            Focus::Delay => self.adjust_delay(key.code),
        }
    }

    fn edit_text(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.text.push(c);
            }
            KeyCode::Enter => self.text.push('\n'),
            KeyCode::Backspace => {
                self.text.pop();
            }
            _ => {}
        }
    }

    fn adjust_speed(&mut self, code: KeyCode) {
        self.speed = match code {
            KeyCode::Left => self.speed.saturating_sub(1).max(SPEED_MIN),
            KeyCode::Right => self.speed.saturating_add(1).min(SPEED_MAX),
            KeyCode::Down => self.speed.saturating_sub(10).max(SPEED_MIN),
            KeyCode::Up => self.speed.saturating_add(10).min(SPEED_MAX),
            _ => self.speed,
        };
    }

    fn adjust_delay(&mut self, code: KeyCode) {
        self.start_delay_secs = match code {
            KeyCode::Left | KeyCode::Down => self.start_delay_secs.saturating_sub(1),
            KeyCode::Right | KeyCode::Up => (self.start_delay_secs + 1).min(START_DELAY_MAX_SECS),
            _ => self.start_delay_secs,
        };
    }

    /// Start a session with a snapshot of the current form values.
    ///
    /// A no-op while a session is active; an empty buffer only flips the
    /// status line to a warning.
    pub fn start_typing(&mut self) {
        let timing = SessionTiming::new(
            Duration::from_secs(self.start_delay_secs),
            self.char_delay(),
        );

        match self.controller.start(&self.text, timing) {
            Ok(true) => {
                self.phase = Phase::Countdown {
                    seconds_left: self.start_delay_secs,
                };
                self.status = Status::new(
                    StatusKind::Active,
                    format!("Typing starts in {} seconds...", self.start_delay_secs),
                );
            }
            Ok(false) => {} // a session is already running
            Err(TyperError::EmptyText) => {
                self.status = Status::new(StatusKind::Warning, "Enter text first!");
            }
            Err(e) => {
                self.status = Status::new(StatusKind::Error, format!("Could not start: {}", e));
            }
        }
    }

    /// Request a stop. The status line flips to "stopped" even when
    /// nothing was running.
    pub fn stop_typing(&mut self) {
        self.controller.stop();
        self.status = Status::new(StatusKind::Info, "Typing stopped.");
    }

    fn on_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Countdown { seconds_left } => {
                self.phase = Phase::Countdown { seconds_left };
                self.status = Status::new(
                    StatusKind::Active,
                    format!("Typing starts in {} seconds...", seconds_left),
                );
            }
            SessionEvent::Started => {
                self.phase = Phase::Typing {
                    emitted: 0,
                    total: self.text.chars().count(),
                };
                self.status = Status::new(StatusKind::Active, "Typing in progress...");
            }
            SessionEvent::Progress { emitted, total } => {
                self.phase = Phase::Typing { emitted, total };
            }
            SessionEvent::Finished(end) => {
                self.controller.reap();
                self.phase = Phase::Idle;
                self.status = match end {
                    SessionEnd::Completed { .. } => {
                        Status::new(StatusKind::Done, "Typing completed! Ready for next.")
                    }
                    SessionEnd::Cancelled { .. } => {
                        Status::new(StatusKind::Info, "Typing stopped.")
                    }
                    SessionEnd::Failed { reason, .. } => {
                        Status::new(StatusKind::Error, format!("Typing failed: {}", reason))
                    }
                };
            }
        }
    }

    pub fn quit(&mut self) {
        self.controller.stop();
        self.should_quit = true;
    }
}
