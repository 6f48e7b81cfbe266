//! Runtime configuration
//!
//! Loaded from YAML or JSON; every field has a default so partial
//! documents are fine.
//!
//! ```yaml
//! page_ready_limit_secs: 10
//! poll_interval_ms: 25
//! ```

use crate::result::{EdslError, EdslResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default time a page gets to become ready (seconds)
pub const DEFAULT_PAGE_READY_LIMIT_SECS: f64 = 30.0;

/// Default interval between readiness checks (milliseconds)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = crate::wait::DEFAULT_POLL_INTERVAL_MS;

/// Page object runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdslConfig {
    /// Limit for `when_ready` when no explicit limit is given
    pub page_ready_limit_secs: f64,
    /// Interval between readiness checks
    pub poll_interval_ms: u64,
}

impl Default for EdslConfig {
    fn default() -> Self {
        Self {
            page_ready_limit_secs: DEFAULT_PAGE_READY_LIMIT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl EdslConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page ready limit in seconds
    #[must_use]
    pub fn with_page_ready_limit_secs(mut self, secs: f64) -> Self {
        self.page_ready_limit_secs = secs;
        self
    }

    /// Set the readiness poll interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Page ready limit as a duration.
    ///
    /// Negative or non-finite limits collapse to zero; call
    /// [`EdslConfig::validate`] to reject them instead.
    #[must_use]
    pub fn page_ready_limit(&self) -> Duration {
        Duration::try_from_secs_f64(self.page_ready_limit_secs).unwrap_or(Duration::ZERO)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Reject settings no wait could honor
    pub fn validate(&self) -> EdslResult<()> {
        if !self.page_ready_limit_secs.is_finite() || self.page_ready_limit_secs < 0.0 {
            return Err(EdslError::ConfigError {
                message: format!(
                    "page_ready_limit_secs must be a non-negative number, got {}",
                    self.page_ready_limit_secs
                ),
            });
        }
        Ok(())
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> EdslResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a YAML document
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> EdslResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else
    /// as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> EdslResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "json") {
            return Self::from_json_str(&text);
        }
        Self::from_yaml_text(&text)
    }

    #[cfg(feature = "yaml")]
    fn from_yaml_text(text: &str) -> EdslResult<Self> {
        Self::from_yaml_str(text)
    }

    #[cfg(not(feature = "yaml"))]
    fn from_yaml_text(_text: &str) -> EdslResult<Self> {
        Err(EdslError::ConfigError {
            message: "YAML support is disabled (enable the `yaml` feature)".to_string(),
        })
    }
}
