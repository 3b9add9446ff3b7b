//! Global start/stop hotkeys.
//!
//! The two hotkeys are registered system-wide and fire no matter which
//! window has focus. The listener loop runs on the tokio blocking pool and
//! forwards commands through a dispatch closure; events for hotkeys we did
//! not register are ignored through an explicit branch, not swallowed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use global_hotkey::hotkey::{Code, HotKey, Modifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::error::{Result, TyperError};

/// Commands produced by the hotkey listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotkeyCommand {
    Start,
    Stop,
}

/// Registers the start/stop hotkeys and runs the listener loop.
pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    start: HotKey,
    stop: HotKey,
    running: Arc<AtomicBool>,
}

impl HotkeyManager {
    /// Register both hotkeys system-wide.
    pub fn new(start_hotkey: &str, stop_hotkey: &str) -> Result<Self> {
        let manager = GlobalHotKeyManager::new()
            .map_err(|e| TyperError::hotkey(format!("failed to create hotkey manager: {}", e)))?;

        let start = parse_hotkey(start_hotkey)?;
        let stop = parse_hotkey(stop_hotkey)?;

        manager.register(start).map_err(|e| {
            TyperError::hotkey(format!("failed to register '{}': {}", start_hotkey, e))
        })?;
        manager.register(stop).map_err(|e| {
            TyperError::hotkey(format!("failed to register '{}': {}", stop_hotkey, e))
        })?;

        info!(start = start_hotkey, stop = stop_hotkey, "global hotkeys registered");

        Ok(Self {
            manager,
            start,
            stop,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Map a hotkey event id to a command.
    fn classify(&self, id: u32) -> Option<HotkeyCommand> {
        if id == self.start.id() {
            Some(HotkeyCommand::Start)
        } else if id == self.stop.id() {
            Some(HotkeyCommand::Stop)
        } else {
            None
        }
    }

    /// Stop the listener loop and unregister both hotkeys.
    pub fn unregister(&self) -> Result<()> {
        self.running.store(false, Ordering::Relaxed);
        self.manager
            .unregister_all(&[self.start, self.stop])
            .map_err(|e| TyperError::hotkey(format!("failed to unregister hotkeys: {}", e)))
    }

    /// Run the listener loop on the blocking pool.
    ///
    /// Key presses on the registered hotkeys are pushed through `dispatch`;
    /// releases and unrecognized events are ignored explicitly.
    pub fn start_listener(
        self: Arc<Self>,
        runtime: &Handle,
        dispatch: impl Fn(HotkeyCommand) + Send + Sync + 'static,
    ) {
        let receiver = GlobalHotKeyEvent::receiver();
        let manager = self;

        runtime.spawn_blocking(move || {
            while manager.running.load(Ordering::Relaxed) {
                if let Ok(event) = receiver.try_recv() {
                    if event.state != HotKeyState::Pressed {
                        // key releases carry no action
                    } else {
                        match manager.classify(event.id) {
                            Some(command) => {
                                debug!(?command, "hotkey pressed");
                                dispatch(command);
                            }
                            None => {
                                debug!(id = event.id, "ignoring unrecognized hotkey event");
                            }
                        }
                    }
                }

                // Small sleep to prevent busy waiting
                std::thread::sleep(std::time::Duration::from_millis(10));
            }

            debug!("hotkey listener stopped");
        });
    }
}

/// Parse a hotkey string like "f9" or "ctrl+alt+t".
pub fn parse_hotkey(hotkey_str: &str) -> Result<HotKey> {
    let binding = hotkey_str.to_lowercase();
    let parts: Vec<&str> = binding.split('+').map(|s| s.trim()).collect();

    let mut modifiers = Modifiers::empty();
    let mut key_code = None;

    for part in &parts {
        match *part {
            "" => {
                return Err(TyperError::invalid_hotkey(hotkey_str, "empty key segment"));
            }
            "ctrl" | "control" => modifiers |= Modifiers::CONTROL,
            "alt" => modifiers |= Modifiers::ALT,
            "shift" => modifiers |= Modifiers::SHIFT,
            "meta" | "cmd" | "super" => modifiers |= Modifiers::SUPER,
            key => {
                if key_code.is_some() {
                    return Err(TyperError::invalid_hotkey(
                        hotkey_str,
                        "more than one non-modifier key",
                    ));
                }
                key_code = Some(parse_key_code(hotkey_str, key)?);
            }
        }
    }

    let code = key_code
        .ok_or_else(|| TyperError::invalid_hotkey(hotkey_str, "no key specified"))?;

    Ok(HotKey::new(Some(modifiers), code))
}

fn parse_key_code(hotkey_str: &str, key: &str) -> Result<Code> {
    let code = match key {
        // Function keys are the usual choice for start/stop bindings.
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,

        "a" => Code::KeyA,
        "b" => Code::KeyB,
        "c" => Code::KeyC,
        "d" => Code::KeyD,
        "e" => Code::KeyE,
        "f" => Code::KeyF,
        "g" => Code::KeyG,
        "h" => Code::KeyH,
        "i" => Code::KeyI,
        "j" => Code::KeyJ,
        "k" => Code::KeyK,
        "l" => Code::KeyL,
        "m" => Code::KeyM,
        "n" => Code::KeyN,
        "o" => Code::KeyO,
        "p" => Code::KeyP,
        "q" => Code::KeyQ,
        "r" => Code::KeyR,
        "s" => Code::KeyS,
        "t" => Code::KeyT,
        "u" => Code::KeyU,
        "v" => Code::KeyV,
        "w" => Code::KeyW,
        "x" => Code::KeyX,
        "y" => Code::KeyY,
        "z" => Code::KeyZ,

        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,

        "space" => Code::Space,
        "enter" | "return" => Code::Enter,
        "tab" => Code::Tab,
        "escape" | "esc" => Code::Escape,
        "backspace" => Code::Backspace,
        "insert" | "ins" => Code::Insert,
        "home" => Code::Home,
        "end" => Code::End,
        "pageup" | "pgup" => Code::PageUp,
        "pagedown" | "pgdn" => Code::PageDown,
        "pause" | "break" => Code::Pause,
        "scrolllock" | "scroll_lock" => Code::ScrollLock,
        "printscreen" | "prtsc" => Code::PrintScreen,

        other => {
            return Err(TyperError::invalid_hotkey(
                hotkey_str,
                format!("unsupported key '{}'", other),
            ))
        }
    };

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_function_key() {
        let hotkey = parse_hotkey("f9").unwrap();
        assert_eq!(hotkey, HotKey::new(Some(Modifiers::empty()), Code::F9));
    }

    #[test]
    fn parses_modifier_combination() {
        let hotkey = parse_hotkey("Ctrl+Alt+T").unwrap();
        assert_eq!(
            hotkey,
            HotKey::new(Some(Modifiers::CONTROL | Modifiers::ALT), Code::KeyT)
        );
    }

    #[test]
    fn rejects_malformed_hotkeys() {
        assert!(parse_hotkey("").is_err());
        assert!(parse_hotkey("ctrl+").is_err());
        assert!(parse_hotkey("a+b").is_err());
        assert!(parse_hotkey("ctrl+alt").is_err());
        assert!(parse_hotkey("warpcore").is_err());
    }
}
