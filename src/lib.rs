//! # Ghost Typer
//!
//! A hands-free text typer: enter a text, pick a speed and a start delay,
//! focus any window, and let the tool type the text for you. Typing is
//! started and stopped with global hotkeys that work regardless of which
//! window has focus.
//!
//! ## Features
//!
//! - Types into whichever application currently has keyboard focus
//! - Speed control (1-100) mapped to a per-character delay, plus an
//!   optional explicit delay override
//! - Cancellable start-delay countdown before the first character
//! - Global start/stop hotkeys (default F9/F10)
//! - Terminal form UI, or a `--oneshot` mode for scripted use
//! - JSON configuration file support
//!
//! ## Example
//!
//! ```no_run
//! use ghost_typer::emitter::enigo_factory;
//! use ghost_typer::session::{SessionController, SessionTiming};
//!
//! let runtime = tokio::runtime::Runtime::new().unwrap();
//!
//! // Events are delivered through the closure; here we just log them.
//! let mut controller = SessionController::new(
//!     runtime.handle().clone(),
//!     enigo_factory(),
//!     |event| println!("{:?}", event),
//! );
//!
//! controller.start("hello world", SessionTiming::immediate()).unwrap();
//! ```
//!
//! ## Configuration
//!
//! Configuration can be provided via JSON files:
//!
//! ```json
//! {
//!   "speed": 80,
//!   "start_delay_secs": 3,
//!   "start_hotkey": "f9",
//!   "stop_hotkey": "f10",
//!   "char_delay": "150ms"
//! }
//! ```

pub mod app;
pub mod config;
pub mod emitter;
pub mod error;
pub mod hotkeys;
pub mod runtime;
pub mod session;
pub mod ui;

pub use config::Config;
pub use emitter::{EnigoSink, KeystrokeSink, RecordingSink};
pub use error::{Result, TyperError};
pub use hotkeys::{HotkeyCommand, HotkeyManager};
pub use session::{CancelToken, SessionController, SessionEnd, SessionEvent, SessionTiming};
