//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Upstream API configuration.
///
/// Account and match endpoints live on the regional routing host,
/// league entries on the platform routing host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_regional_base_url")]
    pub regional_base_url: String,

    #[serde(default = "default_platform_base_url")]
    pub platform_base_url: String,

    /// API key sent as `X-Riot-Token`. One shared credential per process.
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_regional_base_url() -> String {
    "https://europe.api.riotgames.com".to_string()
}

fn default_platform_base_url() -> String {
    "https://euw1.api.riotgames.com".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            regional_base_url: default_regional_base_url(),
            platform_base_url: default_platform_base_url(),
            api_key: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

/// Request budget configuration.
///
/// Defaults mirror a development key: 100 requests per rolling 120 s window.
/// The long window is the binding constraint; the per-second spacing exists
/// only to keep bursts polite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tokens available per refill window.
    #[serde(default = "default_burst")]
    pub burst: u32,

    /// The bucket refills in full every this many seconds.
    #[serde(default = "default_refill_window")]
    pub refill_window_seconds: u64,

    /// Minimum gap between consecutive dispatches.
    #[serde(default = "default_min_spacing")]
    pub min_spacing_ms: u64,

    /// Hard cap on simultaneously in-flight requests.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: u32,

    /// Wait applied on a throttle response that carries no hint.
    #[serde(default = "default_throttle_fallback")]
    pub throttle_fallback_seconds: u64,
}

fn default_burst() -> u32 {
    100
}

fn default_refill_window() -> u64 {
    120
}

fn default_min_spacing() -> u64 {
    50
}

fn default_max_in_flight() -> u32 {
    3
}

fn default_throttle_fallback() -> u64 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: default_burst(),
            refill_window_seconds: default_refill_window(),
            min_spacing_ms: default_min_spacing(),
            max_in_flight: default_max_in_flight(),
            throttle_fallback_seconds: default_throttle_fallback(),
        }
    }
}

/// Analysis tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Recent ranked matches to pull per player.
    #[serde(default = "default_match_count")]
    pub match_count: u32,

    /// Fraction of identities that must resolve for the batch to count.
    #[serde(default = "default_min_resolved_fraction")]
    pub min_resolved_fraction: f64,
}

fn default_match_count() -> u32 {
    20
}

fn default_min_resolved_fraction() -> f64 {
    0.8
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            match_count: default_match_count(),
            min_resolved_fraction: default_min_resolved_fraction(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api: ApiConfig::default(),
            rate_limit: RateLimitConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "API timeout must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.burst == 0 {
            return Err(ConfigError::ValidationError(
                "rate limit burst must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.refill_window_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "rate limit refill window must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.max_in_flight == 0 {
            return Err(ConfigError::ValidationError(
                "max in-flight requests must be greater than 0".to_string(),
            ));
        }

        if self.analysis.match_count == 0 {
            return Err(ConfigError::ValidationError(
                "match count must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.analysis.min_resolved_fraction) {
            return Err(ConfigError::ValidationError(
                "min resolved fraction must be between 0 and 1".to_string(),
            ));
        }

        Ok(())
    }
}
