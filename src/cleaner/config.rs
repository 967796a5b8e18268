//! Cleaner configuration.
//!
//! `CleanerConfig` holds the few tunables of a clearing operation. Defaults match
//! what the extension ships with; the fluent [`CleanerConfig::builder()`] allows
//! overriding them with validation.
//!
//! ```rust
//! use domain_cleaner::CleanerConfig;
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = CleanerConfig::builder()
//!     .history_max_results(500)
//!     .reload_bypass_cache(false)
//!     .build()?;
//! assert_eq!(cfg.history_max_results, 500);
//! # Ok(()) }
//! ```
//!
//! # Fields
//! - `history_start_time`: history search lower bound in ms since epoch (default: 0, all history).
//! - `history_max_results`: maximum hits per hostname search (default: 10000).
//! - `erase_since`: erase data newer than this timestamp (default: 0, everything).
//! - `reload_bypass_cache`: reload tabs after cleaning without using the cache (default: true).
//! - `event_channel_capacity`: capacity of the event bus (default: [`DEFAULT_CHANNEL_CAPACITY`]).
//! - `hsts_settings_url`: browser page for deleting HSTS entries (default: [`DEFAULT_HSTS_SETTINGS_URL`]).

use std::fmt;

use crate::cleaner::DEFAULT_CHANNEL_CAPACITY;

pub const DEFAULT_HISTORY_MAX_RESULTS: usize = 10_000;
pub const DEFAULT_HSTS_SETTINGS_URL: &str = "chrome://net-internals/#hsts";

#[derive(Debug, Clone)]
pub struct CleanerConfig {
    pub history_start_time: u64,
    pub history_max_results: usize,
    pub erase_since: u64,
    pub reload_bypass_cache: bool,
    pub event_channel_capacity: usize,
    pub hsts_settings_url: String,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            history_start_time: 0,
            history_max_results: DEFAULT_HISTORY_MAX_RESULTS,
            erase_since: 0,
            reload_bypass_cache: true,
            event_channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            hsts_settings_url: DEFAULT_HSTS_SETTINGS_URL.to_string(),
        }
    }
}

impl CleanerConfig {
    pub fn builder() -> CleanerConfigBuilder {
        CleanerConfigBuilder::default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CleanerConfigBuilder {
    inner: CleanerConfig,
}

impl CleanerConfigBuilder {
    #[inline]
    fn map(mut self, f: impl FnOnce(&mut CleanerConfig)) -> Self {
        f(&mut self.inner);
        self
    }

    pub fn history_start_time(self, ms: u64) -> Self { self.map(|c| c.history_start_time = ms) }
    pub fn history_max_results(self, n: usize) -> Self { self.map(|c| c.history_max_results = n) }
    pub fn erase_since(self, ms: u64) -> Self { self.map(|c| c.erase_since = ms) }
    pub fn reload_bypass_cache(self, on: bool) -> Self { self.map(|c| c.reload_bypass_cache = on) }
    pub fn event_channel_capacity(self, n: usize) -> Self { self.map(|c| c.event_channel_capacity = n) }
    pub fn hsts_settings_url(self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.map(|c| c.hsts_settings_url = url)
    }

    /// Validate and build the final config.
    pub fn build(self) -> Result<CleanerConfig, CleanerConfigError> {
        validate(&self.inner)?;
        Ok(self.inner)
    }
}

// ---------- Validation ----------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanerConfigError {
    ZeroHistoryResults,
    ZeroChannelCapacity,
    EmptyHstsSettingsUrl,
}

impl fmt::Display for CleanerConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanerConfigError::ZeroHistoryResults => write!(f, "history_max_results must be at least 1"),
            CleanerConfigError::ZeroChannelCapacity => write!(f, "event_channel_capacity must be at least 1"),
            CleanerConfigError::EmptyHstsSettingsUrl => write!(f, "hsts_settings_url must not be empty"),
        }
    }
}
impl std::error::Error for CleanerConfigError {}

fn validate(c: &CleanerConfig) -> Result<(), CleanerConfigError> {
    if c.history_max_results == 0 {
        return Err(CleanerConfigError::ZeroHistoryResults);
    }
    if c.event_channel_capacity == 0 {
        return Err(CleanerConfigError::ZeroChannelCapacity);
    }
    if c.hsts_settings_url.trim().is_empty() {
        return Err(CleanerConfigError::EmptyHstsSettingsUrl);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_search_all_history() {
        let cfg = CleanerConfig::default();
        assert_eq!(cfg.history_start_time, 0);
        assert_eq!(cfg.history_max_results, 10_000);
        assert_eq!(cfg.erase_since, 0);
        assert!(cfg.reload_bypass_cache);
        assert_eq!(cfg.hsts_settings_url, "chrome://net-internals/#hsts");
    }

    #[test]
    fn builder_rejects_zero_limits() {
        assert_eq!(
            CleanerConfig::builder().history_max_results(0).build().unwrap_err(),
            CleanerConfigError::ZeroHistoryResults
        );
        assert_eq!(
            CleanerConfig::builder().event_channel_capacity(0).build().unwrap_err(),
            CleanerConfigError::ZeroChannelCapacity
        );
        assert_eq!(
            CleanerConfig::builder().hsts_settings_url(" ").build().unwrap_err(),
            CleanerConfigError::EmptyHstsSettingsUrl
        );
    }

    #[test]
    fn builder_applies_overrides() {
        let cfg = CleanerConfig::builder()
            .history_start_time(1_000)
            .erase_since(2_000)
            .build()
            .unwrap();
        assert_eq!(cfg.history_start_time, 1_000);
        assert_eq!(cfg.erase_since, 2_000);
    }
}
