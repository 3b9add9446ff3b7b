//! Custom error types for ghost-typer.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

/// Main error type for ghost-typer operations.
#[derive(Error, Debug)]
pub enum TyperError {
    /// Typing was requested with an empty text buffer.
    #[error("no text to type")]
    EmptyText,

    /// The speed control is outside the 1-100 domain.
    #[error("speed must be between 1 and 100, got {value}")]
    InvalidSpeed { value: u64 },

    /// The start delay is outside the 0-10 second domain.
    #[error("start delay must be between 0 and 10 seconds, got {value}")]
    InvalidStartDelay { value: u64 },

    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// The configured hotkey string cannot be parsed.
    #[error("invalid hotkey '{hotkey}': {reason}")]
    InvalidHotkey { hotkey: String, reason: String },

    /// Error registering or handling a global hotkey.
    #[error("hotkey error: {0}")]
    Hotkey(String),

    /// The keystroke emitter could not be created or failed to emit.
    #[error("emitter error: {0}")]
    Emitter(String),

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing configuration file.
    #[error("failed to save config to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ghost-typer operations.
pub type Result<T> = std::result::Result<T, TyperError>;

impl TyperError {
    /// Create a new InvalidSpeed error.
    pub fn invalid_speed(value: u64) -> Self {
        Self::InvalidSpeed { value }
    }

    /// Create a new InvalidStartDelay error.
    pub fn invalid_start_delay(value: u64) -> Self {
        Self::InvalidStartDelay { value }
    }

    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidHotkey error.
    pub fn invalid_hotkey(hotkey: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHotkey {
            hotkey: hotkey.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Hotkey error.
    pub fn hotkey(message: impl Into<String>) -> Self {
        Self::Hotkey(message.into())
    }

    /// Create a new Emitter error.
    pub fn emitter(message: impl Into<String>) -> Self {
        Self::Emitter(message.into())
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new ConfigSave error.
    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TyperError::invalid_speed(140);
        assert_eq!(err.to_string(), "speed must be between 1 and 100, got 140");

        let err = TyperError::invalid_hotkey("ctrl+", "no key specified");
        assert_eq!(err.to_string(), "invalid hotkey 'ctrl+': no key specified");

        let err = TyperError::config_validation("speed out of range");
        assert_eq!(err.to_string(), "configuration error: speed out of range");

        let err = TyperError::EmptyText;
        assert_eq!(err.to_string(), "no text to type");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let typer_err: TyperError = io_err.into();
        assert!(matches!(typer_err, TyperError::Io(_)));
    }
}
