//! Runtime settings for the native host (CLI and simulator).
//!
//! These are tunables that the browser build hard-codes; every field has a
//! default so an empty TOML file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root runtime settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeSettings {
    #[serde(default)]
    pub layout: LayoutSettings,

    #[serde(default)]
    pub navigation: NavigationSettings,

    #[serde(default)]
    pub telemetry: TelemetrySettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

impl RuntimeSettings {
    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=5).contains(&self.layout.min_signals) {
            return Err(ConfigError::InvalidValue {
                field: "layout.min_signals".to_string(),
                message: "must be between 1 and 5".to_string(),
            });
        }
        if self.layout.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "layout.frame_interval_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.navigation.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "navigation.poll_interval_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        for (field, value) in [
            ("telemetry.ping_interval_ms", self.telemetry.ping_interval_ms),
            ("telemetry.overlay_refresh_ms", self.telemetry.overlay_refresh_ms),
            ("telemetry.fps_report_ms", self.telemetry.fps_report_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Transform engine tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSettings {
    /// Readiness quorum.
    #[serde(default = "default_min_signals")]
    pub min_signals: usize,

    /// Readiness timeout in milliseconds.
    #[serde(default = "default_readiness_timeout_ms")]
    pub readiness_timeout_ms: u64,

    /// Animation frame period in milliseconds.
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

fn default_min_signals() -> usize {
    3
}

fn default_readiness_timeout_ms() -> u64 {
    10_000
}

fn default_frame_interval_ms() -> u64 {
    16
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            min_signals: default_min_signals(),
            readiness_timeout_ms: default_readiness_timeout_ms(),
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl LayoutSettings {
    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(self.readiness_timeout_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }
}

/// URL polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl NavigationSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Lag telemetry timings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_overlay_refresh_ms")]
    pub overlay_refresh_ms: u64,

    #[serde(default = "default_fps_report_ms")]
    pub fps_report_ms: u64,

    /// Pending board interactions older than this are dropped.
    #[serde(default = "default_input_timeout_ms")]
    pub input_timeout_ms: u64,

    /// Endpoint probed for ping; `None` disables HTTP probing.
    #[serde(default)]
    pub ping_url: Option<String>,
}

fn default_ping_interval_ms() -> u64 {
    5_000
}

fn default_overlay_refresh_ms() -> u64 {
    1_000
}

fn default_fps_report_ms() -> u64 {
    1_000
}

fn default_input_timeout_ms() -> u64 {
    2_000
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            ping_interval_ms: default_ping_interval_ms(),
            overlay_refresh_ms: default_overlay_refresh_ms(),
            fps_report_ms: default_fps_report_ms(),
            input_timeout_ms: default_input_timeout_ms(),
            ping_url: None,
        }
    }
}

impl TelemetrySettings {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn overlay_refresh(&self) -> Duration {
        Duration::from_millis(self.overlay_refresh_ms)
    }

    pub fn fps_report(&self) -> Duration {
        Duration::from_millis(self.fps_report_ms)
    }

    pub fn input_timeout(&self) -> Duration {
        Duration::from_millis(self.input_timeout_ms)
    }
}

/// Where the file-backed config store lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_path() -> String {
    "~/.chesskit/storage.json".to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = RuntimeSettings::default();
        assert_eq!(settings.layout.min_signals, 3);
        assert_eq!(settings.layout.readiness_timeout(), Duration::from_secs(10));
        assert_eq!(settings.layout.frame_interval(), Duration::from_millis(16));
        assert_eq!(settings.navigation.poll_interval(), Duration::from_millis(500));
        assert_eq!(settings.telemetry.ping_interval(), Duration::from_secs(5));
        assert_eq!(settings.telemetry.overlay_refresh(), Duration::from_secs(1));
        assert_eq!(settings.telemetry.input_timeout(), Duration::from_secs(2));
        assert!(settings.telemetry.ping_url.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_min_signals_range() {
        let mut settings = RuntimeSettings::default();
        settings.layout.min_signals = 0;
        assert!(settings.validate().is_err());
        settings.layout.min_signals = 6;
        assert!(settings.validate().is_err());
        settings.layout.min_signals = 5;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut settings = RuntimeSettings::default();
        settings.telemetry.fps_report_ms = 0;
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("telemetry.fps_report_ms"));
    }
}
