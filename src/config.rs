//! Runtime configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

use canvas::config::EditorConfig;
use canvas::consts::{DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, NUDGE_STEP, ROTATE_STEP_DEG, ZOOM_MAX, ZOOM_MIN};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SYNC_DEBOUNCE_MS: u64 = 120;

/// Configuration could not be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("MARINA_API_BASE_URL is empty")]
    EmptyBaseUrl,
    #[error("zoom range is inverted: min {min} > max {max}")]
    InvertedZoomRange { min: f64, max: f64 },
    #[error("{var} must be a positive number, got {value}")]
    NonPositive { var: &'static str, value: f64 },
}

impl ConfigError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyBaseUrl => "E_CONFIG_BASE_URL",
            Self::InvertedZoomRange { .. } => "E_CONFIG_ZOOM_RANGE",
            Self::NonPositive { .. } => "E_CONFIG_VALUE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub timeouts: Timeouts,
    /// Quiet period before an update is sent.
    pub sync_debounce: Duration,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub nudge_step: f64,
    pub rotate_step: f64,
    pub zoom_min: f64,
    pub zoom_max: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            api_token: None,
            timeouts: Timeouts {
                request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
                connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            },
            sync_debounce: Duration::from_millis(DEFAULT_SYNC_DEBOUNCE_MS),
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            nudge_step: NUDGE_STEP,
            rotate_step: ROTATE_STEP_DEG,
            zoom_min: ZOOM_MIN,
            zoom_max: ZOOM_MAX,
        }
    }
}

impl Config {
    /// Build typed config from environment variables.
    ///
    /// All optional:
    /// - `MARINA_API_BASE_URL`: default `http://127.0.0.1:8000/api/v1`
    /// - `MARINA_API_TOKEN`: sent as a bearer token when set
    /// - `MARINA_REQUEST_TIMEOUT_SECS`: default 30
    /// - `MARINA_CONNECT_TIMEOUT_SECS`: default 10
    /// - `MARINA_SYNC_DEBOUNCE_MS`: default 120
    /// - `MARINA_VIEWPORT_WIDTH` / `MARINA_VIEWPORT_HEIGHT`: default 800 / 600
    /// - `MARINA_NUDGE_STEP`, `MARINA_ROTATE_STEP`: default 5 / 5
    /// - `MARINA_ZOOM_MIN`, `MARINA_ZOOM_MAX`: default 0.1 / 3.0
    ///
    /// Unparseable numbers fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty base URL, an inverted zoom range
    /// or a non-positive size or step.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let api_base_url = std::env::var("MARINA_API_BASE_URL")
            .unwrap_or(defaults.api_base_url)
            .trim()
            .trim_end_matches('/')
            .to_string();
        let api_token = std::env::var("MARINA_API_TOKEN").ok().filter(|t| !t.trim().is_empty());

        let config = Self {
            api_base_url,
            api_token,
            timeouts: Timeouts {
                request_secs: env_parse("MARINA_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse("MARINA_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            sync_debounce: Duration::from_millis(env_parse("MARINA_SYNC_DEBOUNCE_MS", DEFAULT_SYNC_DEBOUNCE_MS)),
            viewport_width: env_parse("MARINA_VIEWPORT_WIDTH", defaults.viewport_width),
            viewport_height: env_parse("MARINA_VIEWPORT_HEIGHT", defaults.viewport_height),
            nudge_step: env_parse("MARINA_NUDGE_STEP", defaults.nudge_step),
            rotate_step: env_parse("MARINA_ROTATE_STEP", defaults.rotate_step),
            zoom_min: env_parse("MARINA_ZOOM_MIN", defaults.zoom_min),
            zoom_max: env_parse("MARINA_ZOOM_MAX", defaults.zoom_max),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that parsing alone cannot guarantee.
    ///
    /// # Errors
    ///
    /// See [`Config::from_env`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        let positive = [
            ("MARINA_VIEWPORT_WIDTH", self.viewport_width),
            ("MARINA_VIEWPORT_HEIGHT", self.viewport_height),
            ("MARINA_NUDGE_STEP", self.nudge_step),
            ("MARINA_ROTATE_STEP", self.rotate_step),
            ("MARINA_ZOOM_MIN", self.zoom_min),
        ];
        for (var, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositive { var, value });
            }
        }
        if self.zoom_min > self.zoom_max {
            return Err(ConfigError::InvertedZoomRange { min: self.zoom_min, max: self.zoom_max });
        }
        Ok(())
    }

    /// Editor tuning derived from this config.
    #[must_use]
    pub fn editor(&self) -> EditorConfig {
        EditorConfig {
            nudge_step: self.nudge_step,
            rotate_step: self.rotate_step,
            zoom_min: self.zoom_min,
            zoom_max: self.zoom_max,
            ..EditorConfig::default()
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}
