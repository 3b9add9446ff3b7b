//! Event plumbing for the form's main loop.
//!
//! Terminal input, the global hotkey listener and the typing worker all
//! feed one channel; the loop drains it one event at a time and falls back
//! to `Tick` when nothing arrives within the tick interval.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::hotkeys::HotkeyCommand;
use crate::session::SessionEvent;

/// Unified event type consumed by the form.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Hotkey(HotkeyCommand),
    Session(SessionEvent),
}

/// Single-receiver hub for all event producers.
pub struct EventHub {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
    tick: Duration,
}

impl EventHub {
    pub fn new(tick: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, tick }
    }

    /// Cloneable sender handed to listeners and workers.
    pub fn sender(&self) -> Sender<AppEvent> {
        self.tx.clone()
    }

    /// Spawn the thread that forwards crossterm key/resize events.
    pub fn spawn_terminal_reader(&self) {
        let tx = self.tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });
    }

    /// Block for up to one tick interval and return the next event,
    /// or `Tick` if the interval expires.
    pub fn next(&self) -> AppEvent {
        match self.rx.recv_timeout(self.tick) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_returns_tick_on_timeout() {
        let hub = EventHub::new(Duration::from_millis(1));
        match hub.next() {
            AppEvent::Tick => {}
            other => panic!("expected Tick on timeout, got {:?}", other),
        }
    }

    #[test]
    fn next_passes_through_events() {
        let hub = EventHub::new(Duration::from_millis(10));
        hub.sender().send(AppEvent::Resize).unwrap();
        match hub.next() {
            AppEvent::Resize => {}
            other => panic!("expected Resize, got {:?}", other),
        }
    }

    #[test]
    fn producers_share_one_receiver() {
        let hub = EventHub::new(Duration::from_millis(10));
        let a = hub.sender();
        let b = hub.sender();
        a.send(AppEvent::Hotkey(HotkeyCommand::Start)).unwrap();
        b.send(AppEvent::Hotkey(HotkeyCommand::Stop)).unwrap();

        assert!(matches!(hub.next(), AppEvent::Hotkey(HotkeyCommand::Start)));
        assert!(matches!(hub.next(), AppEvent::Hotkey(HotkeyCommand::Stop)));
    }
}
