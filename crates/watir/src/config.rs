//! Session configuration: wait timeout, poll interval and relocation policy.
//!
//! Process-wide defaults live behind [`defaults`]/[`set_defaults`] and are
//! seeded from the environment on first use:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `WATIR_DEFAULT_TIMEOUT` | `default_timeout` (seconds) |
//! | `WATIR_POLL_INTERVAL` | `poll_interval` (seconds) |
//! | `WATIR_ALWAYS_LOCATE` | `always_locate` (`true`/`false`/`1`/`0`) |
//!
//! Each [`Browser`](crate::browser::Browser) copies the defaults when it is
//! created and can override them for its own session.

use crate::result::{WatirError, WatirResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{OnceLock, PoisonError, RwLock};
use std::time::Duration;

/// Default wait timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

/// Default poll interval in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: f64 = 0.1;

const ENV_TIMEOUT: &str = "WATIR_DEFAULT_TIMEOUT";
const ENV_INTERVAL: &str = "WATIR_POLL_INTERVAL";
const ENV_ALWAYS_LOCATE: &str = "WATIR_ALWAYS_LOCATE";

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds to wait for elements; `0` disables waiting
    pub default_timeout: f64,
    /// Seconds between wait polls
    pub poll_interval: f64,
    /// Relocate stale elements transparently
    pub always_locate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT_SECS,
            poll_interval: DEFAULT_POLL_INTERVAL_SECS,
            always_locate: true,
        }
    }
}

impl Config {
    /// Built-in defaults, ignoring the environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wait timeout in seconds
    #[must_use]
    pub fn with_default_timeout(mut self, secs: f64) -> Self {
        self.default_timeout = secs;
        self
    }

    /// Set the poll interval in seconds
    #[must_use]
    pub fn with_poll_interval(mut self, secs: f64) -> Self {
        self.poll_interval = secs;
        self
    }

    /// Enable or disable transparent relocation
    #[must_use]
    pub const fn with_always_locate(mut self, always_locate: bool) -> Self {
        self.always_locate = always_locate;
        self
    }

    /// Wait timeout as a duration
    #[must_use]
    pub fn timeout(&self) -> Duration {
        secs_to_duration(self.default_timeout)
    }

    /// Poll interval as a duration
    #[must_use]
    pub fn interval(&self) -> Duration {
        secs_to_duration(self.poll_interval)
    }

    /// Wait options derived from this configuration
    #[must_use]
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions::new()
            .with_timeout(self.timeout().as_millis() as u64)
            .with_poll_interval(self.interval().as_millis() as u64)
    }

    /// Reject negative or non-finite durations
    pub fn validate(&self) -> WatirResult<()> {
        for (name, value) in [
            ("default_timeout", self.default_timeout),
            ("poll_interval", self.poll_interval),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(WatirError::Config {
                    message: format!("{name} must be a non-negative number of seconds, got {value}"),
                });
            }
        }
        Ok(())
    }

    /// Parse YAML; missing fields take their defaults
    pub fn from_yaml_str(yaml: &str) -> WatirResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| WatirError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML file
    pub fn from_path(path: impl AsRef<Path>) -> WatirResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Overlay `WATIR_*` environment variables
    pub fn with_env_overrides(self) -> WatirResult<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> WatirResult<Self> {
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            self.default_timeout = parse_secs(ENV_TIMEOUT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_INTERVAL) {
            self.poll_interval = parse_secs(ENV_INTERVAL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ALWAYS_LOCATE) {
            self.always_locate = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                other => {
                    return Err(WatirError::Config {
                        message: format!("{ENV_ALWAYS_LOCATE}: expected a boolean, got {other:?}"),
                    })
                }
            };
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_secs(name: &str, raw: &str) -> WatirResult<f64> {
    raw.trim().parse::<f64>().map_err(|e| WatirError::Config {
        message: format!("{name}: {e}"),
    })
}

fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

// ============================================================================
// Process-wide defaults
// ============================================================================

fn global() -> &'static RwLock<Config> {
    static DEFAULTS: OnceLock<RwLock<Config>> = OnceLock::new();
    DEFAULTS.get_or_init(|| {
        let config = Config::default()
            .with_env_overrides()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring invalid WATIR_* environment");
                Config::default()
            });
        RwLock::new(config)
    })
}

/// Current process-wide defaults
#[must_use]
pub fn defaults() -> Config {
    global()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replace the process-wide defaults used by browsers created afterwards
pub fn set_defaults(config: Config) -> WatirResult<()> {
    config.validate()?;
    *global().write().unwrap_or_else(PoisonError::into_inner) = config;
    Ok(())
}
