//! Configuration loading, validation and timing derivation.
//!
//! Configuration can be provided via JSON files and overridden from the
//! command line. The per-character delay is normally derived from the
//! speed control; an explicit `char_delay` override takes precedence.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TyperError};

/// Slider domain for the speed control.
pub const SPEED_MIN: u8 = 1;
pub const SPEED_MAX: u8 = 100;

/// Maximum start delay in whole seconds.
pub const START_DELAY_MAX_SECS: u64 = 10;

/// Tool configuration.
///
/// All fields have defaults, so an empty JSON object `{}` is a valid
/// configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Typing speed, 1 (slowest) to 100 (fastest).
    #[serde(default = "default_speed")]
    pub speed: u8,

    /// Delay before the first character is typed, in whole seconds (0-10).
    #[serde(default = "default_start_delay")]
    pub start_delay_secs: u64,

    /// Global hotkey that starts typing.
    #[serde(default = "default_start_hotkey")]
    pub start_hotkey: String,

    /// Global hotkey that stops typing.
    #[serde(default = "default_stop_hotkey")]
    pub stop_hotkey: String,

    /// Explicit per-character delay, e.g. "250ms" or "1s".
    /// Overrides the speed-derived delay when set.
    #[serde(default, with = "opt_duration", skip_serializing_if = "Option::is_none")]
    pub char_delay: Option<Duration>,
}

fn default_speed() -> u8 {
    50
}

fn default_start_delay() -> u64 {
    2
}

fn default_start_hotkey() -> String {
    "f9".to_string()
}

fn default_stop_hotkey() -> String {
    "f10".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            start_delay_secs: default_start_delay(),
            start_hotkey: default_start_hotkey(),
            stop_hotkey: default_stop_hotkey(),
            char_delay: None,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TyperError::config_load(path, e.to_string()))?;
        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| TyperError::config_load(path, e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| TyperError::config_save(path, e.to_string()))?;
        std::fs::write(path, contents).map_err(|e| TyperError::config_save(path, e.to_string()))
    }

    /// Validate all fields against their domains.
    pub fn validate(&self) -> Result<()> {
        if !(SPEED_MIN..=SPEED_MAX).contains(&self.speed) {
            return Err(TyperError::invalid_speed(self.speed as u64));
        }

        if self.start_delay_secs > START_DELAY_MAX_SECS {
            return Err(TyperError::invalid_start_delay(self.start_delay_secs));
        }

        crate::hotkeys::parse_hotkey(&self.start_hotkey)?;
        crate::hotkeys::parse_hotkey(&self.stop_hotkey)?;

        if self.start_hotkey.eq_ignore_ascii_case(&self.stop_hotkey) {
            return Err(TyperError::config_validation(
                "start_hotkey and stop_hotkey must differ",
            ));
        }

        Ok(())
    }

    /// The effective per-character delay.
    pub fn char_delay(&self) -> Duration {
        self.char_delay.unwrap_or_else(|| delay_for_speed(self.speed))
    }

    /// The start delay as a [`Duration`].
    pub fn start_delay(&self) -> Duration {
        Duration::from_secs(self.start_delay_secs)
    }
}

/// Derive the per-character delay from the speed control.
///
/// Speed 100 types with no pause; speed 1 pauses 990ms per character.
pub fn delay_for_speed(speed: u8) -> Duration {
    Duration::from_millis(100u64.saturating_sub(speed as u64) * 10)
}

/// Parse a human duration string like "500ms", "2s" or "1m".
///
/// A bare number is interpreted as milliseconds. Parsing is
/// case-insensitive and tolerates surrounding whitespace.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let normalized = value.trim().to_lowercase();

    if normalized.is_empty() {
        return Err(TyperError::invalid_duration(value, "empty duration"));
    }

    let (digits, unit) = match normalized.find(|c: char| !c.is_ascii_digit()) {
        Some(0) => {
            return Err(TyperError::invalid_duration(
                value,
                "expected a non-negative number",
            ))
        }
        Some(idx) => normalized.split_at(idx),
        None => (normalized.as_str(), "ms"),
    };

    let amount: u64 = digits
        .parse()
        .map_err(|e| TyperError::invalid_duration(value, format!("bad number: {}", e)))?;

    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => Ok(Duration::from_secs(amount * 60)),
        other => Err(TyperError::invalid_duration(
            value,
            format!("unknown unit '{}'", other),
        )),
    }
}

/// Serde adapter for `Option<Duration>` using [`parse_duration`] strings.
mod opt_duration {
    use std::time::Duration;

    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&format!("{}ms", d.as_millis())),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<Duration>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => super::parse_duration(&s).map(Some).map_err(D::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.speed, 50);
        assert_eq!(config.start_delay_secs, 2);
        assert_eq!(config.start_hotkey, "f9");
        assert_eq!(config.stop_hotkey, "f10");
        assert!(config.char_delay.is_none());
    }

    #[test]
    fn speed_to_delay_mapping() {
        assert_eq!(delay_for_speed(100), Duration::from_millis(0));
        assert_eq!(delay_for_speed(50), Duration::from_millis(500));
        assert_eq!(delay_for_speed(1), Duration::from_millis(990));
    }

    #[test]
    fn char_delay_override_wins() {
        let config = Config {
            speed: 100,
            char_delay: Some(Duration::from_millis(250)),
            ..Default::default()
        };
        assert_eq!(config.char_delay(), Duration::from_millis(250));
    }

    #[test]
    fn empty_object_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn identical_hotkeys_rejected() {
        let config = Config {
            start_hotkey: "f9".to_string(),
            stop_hotkey: "F9".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(TyperError::ConfigValidation(_))
        ));
    }
}
