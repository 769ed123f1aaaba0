//! Controller configuration
//!
//! All timings are stored in milliseconds so the configuration can be
//! shipped as plain JSON by the hosting app.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Watched fraction at or above which content counts as finished
    pub finished_threshold: f64,
    /// Interval between progress saves while playing (ms)
    pub persist_interval_ms: u64,
    /// Inactivity before on-screen controls hide (ms)
    pub controls_hide_ms: u64,
    /// Time a transient overlay stays on screen (ms)
    pub overlay_dismiss_ms: u64,
    /// Auto-dismiss for an unanswered resume prompt (ms)
    pub resume_prompt_timeout_ms: u64,
    /// Delay after a seek before reported positions are trusted (ms)
    pub seek_settle_ms: u64,
    /// Time allowed for the surface to confirm a seek (ms)
    pub seek_timeout_ms: u64,
    /// Reported position must be this close to the target to confirm a seek
    pub seek_tolerance_secs: f64,
    /// Seeks never land closer than this to the end of content
    pub end_epsilon_secs: f64,
    /// Look-ahead below which a buffering report stalls playback
    pub min_lookahead_secs: f64,
    /// Window for the second tap of a double tap (ms)
    pub double_tap_window_ms: u64,
    /// Window in which further double taps extend a skip sequence (ms)
    pub skip_decay_ms: u64,
    /// Seconds added per double tap
    pub skip_increment_secs: f64,
    /// Hold time before a press becomes a long-press (ms)
    pub long_press_ms: u64,
    /// Movement in pixels before a press becomes a pan
    pub touch_slop_px: f64,
    /// Playback rate while a long-press is held
    pub speed_boost_rate: f64,
    /// Audio language chosen automatically when tracks arrive
    pub preferred_audio_language: Option<String>,
    /// Subtitle language enabled automatically when tracks arrive
    pub preferred_subtitle_language: Option<String>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            finished_threshold: 0.95,
            persist_interval_ms: 5_000,
            controls_hide_ms: 3_000,
            overlay_dismiss_ms: 1_000,
            resume_prompt_timeout_ms: 30_000,
            seek_settle_ms: 300,
            seek_timeout_ms: 5_000,
            seek_tolerance_secs: 1.0,
            end_epsilon_secs: 0.1,
            min_lookahead_secs: 1.0,
            double_tap_window_ms: 300,
            skip_decay_ms: 800,
            skip_increment_secs: 10.0,
            long_press_ms: 500,
            touch_slop_px: 10.0,
            speed_boost_rate: 2.0,
            preferred_audio_language: None,
            preferred_subtitle_language: None,
        }
    }
}

impl ControllerConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.finished_threshold > 0.0 && self.finished_threshold <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "finished_threshold must be in (0, 1], got {}",
                self.finished_threshold
            )));
        }

        let intervals = [
            ("persist_interval_ms", self.persist_interval_ms),
            ("controls_hide_ms", self.controls_hide_ms),
            ("overlay_dismiss_ms", self.overlay_dismiss_ms),
            ("resume_prompt_timeout_ms", self.resume_prompt_timeout_ms),
            ("seek_timeout_ms", self.seek_timeout_ms),
            ("double_tap_window_ms", self.double_tap_window_ms),
            ("skip_decay_ms", self.skip_decay_ms),
            ("long_press_ms", self.long_press_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, ms)| *ms == 0) {
            return Err(Error::InvalidConfig(format!("{name} must be greater than zero")));
        }

        if self.seek_settle_ms >= self.seek_timeout_ms {
            return Err(Error::InvalidConfig(
                "seek_settle_ms must be shorter than seek_timeout_ms".into(),
            ));
        }
        if self.skip_increment_secs <= 0.0 {
            return Err(Error::InvalidConfig("skip_increment_secs must be positive".into()));
        }
        if self.speed_boost_rate <= 0.0 {
            return Err(Error::InvalidConfig("speed_boost_rate must be positive".into()));
        }
        if self.touch_slop_px < 0.0 || self.end_epsilon_secs < 0.0 || self.seek_tolerance_secs < 0.0 {
            return Err(Error::InvalidConfig("distances must not be negative".into()));
        }
        Ok(())
    }

    pub fn persist_interval(&self) -> Duration {
        Duration::from_millis(self.persist_interval_ms)
    }

    pub fn controls_hide(&self) -> Duration {
        Duration::from_millis(self.controls_hide_ms)
    }

    pub fn overlay_dismiss(&self) -> Duration {
        Duration::from_millis(self.overlay_dismiss_ms)
    }

    pub fn resume_prompt_timeout(&self) -> Duration {
        Duration::from_millis(self.resume_prompt_timeout_ms)
    }

    pub fn seek_settle(&self) -> Duration {
        Duration::from_millis(self.seek_settle_ms)
    }

    pub fn seek_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_timeout_ms)
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }

    pub fn skip_decay(&self) -> Duration {
        Duration::from_millis(self.skip_decay_ms)
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.finished_threshold, 0.95);
        assert_eq!(config.persist_interval(), Duration::from_secs(5));
        assert_eq!(config.skip_decay(), Duration::from_millis(800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = ControllerConfig::from_json(
            r#"{"skip_increment_secs": 5.0, "preferred_audio_language": "ja"}"#,
        )
        .unwrap();
        assert_eq!(config.skip_increment_secs, 5.0);
        assert_eq!(config.preferred_audio_language.as_deref(), Some("ja"));
        assert_eq!(config.controls_hide_ms, 3_000);
    }

    #[test]
    fn test_invalid_threshold() {
        let config = ControllerConfig {
            finished_threshold: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = ControllerConfig::from_json(r#"{"persist_interval_ms": 0}"#).unwrap_err();
        assert!(err.to_string().contains("persist_interval_ms"));
    }

    #[test]
    fn test_settle_must_precede_timeout() {
        let config = ControllerConfig {
            seek_settle_ms: 6_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
