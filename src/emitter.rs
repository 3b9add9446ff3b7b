//! Keystroke emission into the focused window.
//!
//! The typing worker only sees the [`KeystrokeSink`] trait; production
//! wiring uses [`EnigoSink`], tests use [`RecordingSink`]. Sinks are built
//! inside the worker thread through a [`SinkFactory`], since the platform
//! input handle is created on the thread that uses it.

use std::sync::{Arc, Mutex};

use enigo::{Enigo, Keyboard, Settings};

use crate::error::{Result, TyperError};

/// A destination for emitted characters.
pub trait KeystrokeSink {
    /// Synthesize the keystrokes for a single character.
    fn emit(&mut self, ch: char) -> Result<()>;
}

/// Builds a sink on the worker thread at session start.
pub type SinkFactory = Box<dyn Fn() -> Result<Box<dyn KeystrokeSink>> + Send + Sync>;

/// Production sink backed by `enigo`.
pub struct EnigoSink {
    enigo: Enigo,
}

impl EnigoSink {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| TyperError::emitter(format!("failed to initialize enigo: {}", e)))?;
        Ok(Self { enigo })
    }
}

impl KeystrokeSink for EnigoSink {
    fn emit(&mut self, ch: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.enigo
            .text(ch.encode_utf8(&mut buf))
            .map_err(|e| TyperError::emitter(format!("failed to type '{}': {}", ch, e)))
    }
}

/// Factory for the production enigo sink.
pub fn enigo_factory() -> SinkFactory {
    Box::new(|| EnigoSink::new().map(|sink| Box::new(sink) as Box<dyn KeystrokeSink>))
}

/// Test sink that records every emitted character into a shared buffer.
pub struct RecordingSink {
    typed: Arc<Mutex<Vec<char>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::with_buffer(Arc::new(Mutex::new(Vec::new())))
    }

    /// Share a buffer across sink instances, so a factory can hand out
    /// fresh sinks that all record into the same place.
    pub fn with_buffer(typed: Arc<Mutex<Vec<char>>>) -> Self {
        Self { typed }
    }

    pub fn buffer(&self) -> Arc<Mutex<Vec<char>>> {
        Arc::clone(&self.typed)
    }

    pub fn typed_string(&self) -> String {
        self.typed.lock().expect("recording sink poisoned").iter().collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl KeystrokeSink for RecordingSink {
    fn emit(&mut self, ch: char) -> Result<()> {
        self.typed.lock().expect("recording sink poisoned").push(ch);
        Ok(())
    }
}

/// Factory producing [`RecordingSink`]s over a shared buffer.
pub fn recording_factory(typed: Arc<Mutex<Vec<char>>>) -> SinkFactory {
    Box::new(move || {
        Ok(Box::new(RecordingSink::with_buffer(Arc::clone(&typed))) as Box<dyn KeystrokeSink>)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_collects_in_order() {
        let mut sink = RecordingSink::new();
        for ch in "hi there".chars() {
            sink.emit(ch).unwrap();
        }
        assert_eq!(sink.typed_string(), "hi there");
    }

    #[test]
    fn shared_buffer_survives_new_sink_instances() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let factory = recording_factory(Arc::clone(&buffer));

        let mut first = factory().unwrap();
        first.emit('a').unwrap();
        let mut second = factory().unwrap();
        second.emit('b').unwrap();

        let typed: String = buffer.lock().unwrap().iter().collect();
        assert_eq!(typed, "ab");
    }
}
