//! Widget settings and their parsed runtime form.
//!
//! [`Settings`] is the persisted JSON object the host stores for every key.
//! [`ParsedConfig`] is what the controller actually works with: durations and
//! colors, already validated. Parsing never fails from the host's point of
//! view. Bad input is logged with `tracing::warn!` and replaced with a safe
//! fallback (zero duration, default color).
//!
//! # Duration format
//!
//! Durations use the day/clock grammar `[d.]hh:mm[:ss[.fffffff]]` or a bare
//! day count:
//!
//! ```rust
//! use streamtimer_widgets::config::parse_duration;
//! use std::time::Duration;
//!
//! assert_eq!(parse_duration("00:01:00").unwrap(), Duration::from_secs(60));
//! assert_eq!(parse_duration("1.02:00").unwrap(), Duration::from_secs(26 * 3600));
//! assert!(parse_duration("").is_err());
//! ```

use crate::color::Rgba;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Default countdown length.
pub const DEFAULT_TIMER_INTERVAL: &str = "00:01:00";
/// Default flash color.
pub const DEFAULT_ALERT_COLOR: &str = "#FF0000";
/// Black means "pick the color from the remaining time".
pub const DEFAULT_HOURGLASS_COLOR: &str = "#000000";

// Largest day count a span may carry.
const MAX_DAYS: u64 = 10_675_199;

/// Errors raised while interpreting settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings payload is not a JSON object of the expected shape.
    #[error("invalid settings payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A duration string did not match `[d.]hh:mm[:ss[.f]]`.
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),

    /// A color string was neither hex nor a known color name.
    #[error("invalid color: {0:?}")]
    InvalidColor(String),
}

/// Persisted key settings, as exchanged with the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Continue from the paused value instead of restarting on press.
    pub resume_on_click: bool,
    /// Put hours and minutes on separate lines.
    pub multiline: bool,
    /// Countdown length, e.g. `00:05:00`.
    pub timer_interval: String,
    /// File the registry mirrors the countdown into. Empty disables mirroring.
    pub timer_file_name: String,
    /// Text written before the time in the mirrored file.
    pub file_prefix: String,
    /// Base color of the expiry flash.
    pub alert_color: String,
    /// Show a draining bar instead of digits.
    pub hourglass_mode: bool,
    /// Fill color of the bar. Black picks green/yellow/red by remaining time.
    pub hourglass_color: String,
    /// Written to the mirrored file when the countdown ends.
    pub countdown_end_text: String,
    /// Empty the mirrored file on reset.
    pub clear_file_on_reset: bool,
    /// Presses add time instead of pausing a running countdown.
    pub streamathon_mode: bool,
    /// Time added per press in streamathon mode.
    pub streamathon_increment: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resume_on_click: false,
            multiline: false,
            timer_interval: DEFAULT_TIMER_INTERVAL.to_string(),
            timer_file_name: String::new(),
            file_prefix: String::new(),
            alert_color: DEFAULT_ALERT_COLOR.to_string(),
            hourglass_mode: false,
            hourglass_color: DEFAULT_HOURGLASS_COLOR.to_string(),
            countdown_end_text: String::new(),
            clear_file_on_reset: false,
            streamathon_mode: false,
            streamathon_increment: String::new(),
        }
    }
}

impl Settings {
    /// Builds settings from the payload a key was created with.
    ///
    /// Returns the settings and whether they were defaulted. A missing, empty
    /// or malformed payload yields the defaults; the caller is expected to
    /// persist them back to the host in that case.
    pub fn from_payload(payload: Option<&Value>) -> (Self, bool) {
        match payload {
            Some(Value::Object(map)) if !map.is_empty() => {
                match serde_json::from_value::<Settings>(Value::Object(map.clone())) {
                    Ok(settings) => (settings, false),
                    Err(err) => {
                        tracing::warn!(%err, "malformed settings payload, using defaults");
                        (Self::default(), true)
                    }
                }
            }
            _ => (Self::default(), true),
        }
    }

    /// Overlays `payload` on top of these settings.
    ///
    /// Keys missing from the payload keep their current value.
    pub fn merged(&self, payload: &Value) -> Result<Self, ConfigError> {
        let mut base = serde_json::to_value(self)?;
        if let (Value::Object(target), Value::Object(source)) = (&mut base, payload) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        } else if !payload.is_object() {
            return Err(ConfigError::Payload(serde::de::Error::custom(
                "settings payload must be an object",
            )));
        }
        Ok(serde_json::from_value(base)?)
    }

    /// Applies the end-text / clear-on-reset exclusivity after an update.
    ///
    /// `clear_file_on_reset` and `countdown_end_text` cannot both be in
    /// effect. Whichever field changed relative to `previous` wins. When both
    /// changed, `clear_file_on_reset` is checked first and wins.
    pub fn couple_with(mut self, previous: &Settings) -> Self {
        if self.clear_file_on_reset != previous.clear_file_on_reset {
            self.countdown_end_text.clear();
        } else if self.countdown_end_text != previous.countdown_end_text {
            self.clear_file_on_reset = false;
        }
        self
    }
}

/// Typed values derived from [`Settings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfig {
    /// Countdown length. Zero when missing or unparsable.
    pub timer_interval: Duration,
    /// Time added per streamathon press. Zero unless streamathon mode is on
    /// and the increment parses.
    pub streamathon_increment: Duration,
    /// Base color of the expiry flash.
    pub alert_color: Rgba,
    /// Hourglass fill color.
    pub hourglass_color: Rgba,
}

impl ParsedConfig {
    /// Derives the runtime configuration, logging every fallback.
    pub fn from_settings(settings: &Settings) -> Self {
        let timer_interval = match parse_duration(&settings.timer_interval) {
            Ok(interval) => interval,
            Err(err) => {
                tracing::warn!(%err, "invalid timer interval, countdown disabled");
                Duration::ZERO
            }
        };

        let streamathon_increment = if settings.streamathon_mode {
            match parse_duration(&settings.streamathon_increment) {
                Ok(increment) => increment,
                Err(err) => {
                    tracing::warn!(%err, "invalid streamathon increment");
                    Duration::ZERO
                }
            }
        } else {
            Duration::ZERO
        };

        Self {
            timer_interval,
            streamathon_increment,
            alert_color: parse_color(&settings.alert_color, DEFAULT_ALERT_COLOR),
            hourglass_color: parse_color(&settings.hourglass_color, DEFAULT_HOURGLASS_COLOR),
        }
    }
}

impl Default for ParsedConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

fn parse_color(raw: &str, fallback: &str) -> Rgba {
    raw.parse().unwrap_or_else(|err| {
        tracing::warn!(%err, fallback, "invalid color, using fallback");
        fallback.parse().unwrap_or(Rgba::BLACK)
    })
}

fn parse_field(field: &str, max: u64) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse::<u64>().ok().filter(|v| *v <= max)
}

fn parse_fraction(field: &str) -> Option<Duration> {
    if field.is_empty() || field.len() > 7 || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Right-pad to nanoseconds.
    let nanos = format!("{:0<9}", field).parse::<u32>().ok()?;
    Some(Duration::from_nanos(nanos as u64))
}

/// Parses a `[d.]hh:mm[:ss[.fffffff]]` duration or a bare day count.
///
/// Negative spans are rejected since a countdown cannot run backwards.
pub fn parse_duration(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(raw.to_string());
    let s = raw.trim();
    if s.is_empty() || s.starts_with('-') {
        return Err(invalid());
    }

    // Bare day count.
    if !s.contains(':') {
        let days = parse_field(s, MAX_DAYS).ok_or_else(invalid)?;
        return Ok(Duration::from_secs(days * 86_400));
    }

    let (days, clock) = match s.split_once('.') {
        Some((d, rest)) if !d.contains(':') => {
            (parse_field(d, MAX_DAYS).ok_or_else(invalid)?, rest)
        }
        _ => (0, s),
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m] => (*h, *m, None),
        [h, m, sec] => (*h, *m, Some(*sec)),
        _ => return Err(invalid()),
    };

    let hours = parse_field(hours, 23).ok_or_else(invalid)?;
    let minutes = parse_field(minutes, 59).ok_or_else(invalid)?;
    let (seconds, fraction) = match seconds {
        None => (0, Duration::ZERO),
        Some(sec) => match sec.split_once('.') {
            Some((whole, frac)) => (
                parse_field(whole, 59).ok_or_else(invalid)?,
                parse_fraction(frac).ok_or_else(invalid)?,
            ),
            None => (parse_field(sec, 59).ok_or_else(invalid)?, Duration::ZERO),
        },
    };

    Ok(Duration::from_secs(
        days * 86_400 + hours * 3_600 + minutes * 60 + seconds,
    ) + fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_settings_match_schema() {
        let settings = Settings::default();
        let value = serde_json::to_value(&settings).unwrap();

        assert_eq!(value["timerInterval"], "00:01:00");
        assert_eq!(value["alertColor"], "#FF0000");
        assert_eq!(value["hourglassColor"], "#000000");
        assert_eq!(value["timerFileName"], "");
        assert_eq!(value["streamathonIncrement"], "");
        assert_eq!(value["resumeOnClick"], false);
        assert_eq!(value["clearFileOnReset"], false);
    }

    #[test]
    fn test_parse_clock_durations() {
        assert_eq!(parse_duration("00:01:00").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("00:05:00").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("01:30").unwrap(), Duration::from_secs(5_400));
        assert_eq!(parse_duration(" 23:59:59 ").unwrap(), Duration::from_secs(86_399));
    }

    #[test]
    fn test_parse_days_and_fractions() {
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2 * 86_400));
        assert_eq!(
            parse_duration("1.00:00:10").unwrap(),
            Duration::from_secs(86_410)
        );
        assert_eq!(
            parse_duration("00:00:01.5").unwrap(),
            Duration::from_millis(1_500)
        );
    }

    #[test]
    fn test_parse_rejects_invalid_input() {
        for raw in ["", "   ", "abc", "00:60:00", "24:00:00", "1:2:3:4", "-00:01:00", "00:00:61"] {
            assert!(parse_duration(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn test_parsed_config_falls_back_to_zero() {
        let settings = Settings {
            timer_interval: "soon".to_string(),
            ..Settings::default()
        };
        let parsed = ParsedConfig::from_settings(&settings);
        assert_eq!(parsed.timer_interval, Duration::ZERO);

        let empty = Settings {
            timer_interval: String::new(),
            ..Settings::default()
        };
        assert_eq!(ParsedConfig::from_settings(&empty).timer_interval, Duration::ZERO);
    }

    #[test]
    fn test_increment_only_parsed_in_streamathon_mode() {
        let mut settings = Settings {
            streamathon_increment: "00:05:00".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            ParsedConfig::from_settings(&settings).streamathon_increment,
            Duration::ZERO
        );

        settings.streamathon_mode = true;
        assert_eq!(
            ParsedConfig::from_settings(&settings).streamathon_increment,
            Duration::from_secs(300)
        );

        settings.streamathon_increment = "lots".to_string();
        assert_eq!(
            ParsedConfig::from_settings(&settings).streamathon_increment,
            Duration::ZERO
        );
    }

    #[test]
    fn test_invalid_colors_fall_back() {
        let settings = Settings {
            alert_color: "#nope".to_string(),
            hourglass_color: "mauve-ish".to_string(),
            ..Settings::default()
        };
        let parsed = ParsedConfig::from_settings(&settings);
        assert_eq!(parsed.alert_color, Rgba::RED);
        assert_eq!(parsed.hourglass_color, Rgba::BLACK);
    }

    #[test]
    fn test_from_payload_defaults_when_absent() {
        let (settings, defaulted) = Settings::from_payload(None);
        assert!(defaulted);
        assert_eq!(settings, Settings::default());

        let (_, defaulted) = Settings::from_payload(Some(&json!({})));
        assert!(defaulted);

        let (_, defaulted) = Settings::from_payload(Some(&json!({"multiline": "yes"})));
        assert!(defaulted);
    }

    #[test]
    fn test_from_payload_fills_missing_keys() {
        let payload = json!({"multiline": true, "timerInterval": "00:10:00"});
        let (settings, defaulted) = Settings::from_payload(Some(&payload));

        assert!(!defaulted);
        assert!(settings.multiline);
        assert_eq!(settings.timer_interval, "00:10:00");
        assert_eq!(settings.alert_color, DEFAULT_ALERT_COLOR);
    }

    #[test]
    fn test_merged_keeps_unmentioned_keys() {
        let current = Settings {
            file_prefix: "Break: ".to_string(),
            ..Settings::default()
        };
        let merged = current.merged(&json!({"hourglassMode": true})).unwrap();

        assert!(merged.hourglass_mode);
        assert_eq!(merged.file_prefix, "Break: ");
        assert!(current.merged(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_toggling_clear_on_reset_clears_end_text() {
        let previous = Settings {
            countdown_end_text: "Starting soon".to_string(),
            ..Settings::default()
        };
        let updated = Settings {
            clear_file_on_reset: true,
            ..previous.clone()
        }
        .couple_with(&previous);

        assert!(updated.clear_file_on_reset);
        assert_eq!(updated.countdown_end_text, "");
    }

    #[test]
    fn test_editing_end_text_disables_clear_on_reset() {
        let previous = Settings {
            clear_file_on_reset: true,
            ..Settings::default()
        };
        let updated = Settings {
            countdown_end_text: "Live!".to_string(),
            ..previous.clone()
        }
        .couple_with(&previous);

        assert!(!updated.clear_file_on_reset);
        assert_eq!(updated.countdown_end_text, "Live!");
    }

    #[test]
    fn test_changing_both_fields_clear_on_reset_wins() {
        let previous = Settings::default();
        let updated = Settings {
            clear_file_on_reset: true,
            countdown_end_text: "Live!".to_string(),
            ..previous.clone()
        }
        .couple_with(&previous);

        assert!(updated.clear_file_on_reset);
        assert_eq!(updated.countdown_end_text, "");
    }
}
