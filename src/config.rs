// Tunables for the search engine and the speed-test simulation

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// Search configuration options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    // Maximum number of hotels offered when picking one to review
    pub picker_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { picker_limit: 5 }
    }
}

// Speed-test configuration options
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpeedTestConfig {
    pub ping_step_ms: u64,
    pub download_step_ms: u64,
    pub upload_step_ms: u64,
    // Half-open sampling ranges for the synthetic result
    pub download_mbps: Range<u32>,
    pub upload_mbps: Range<u32>,
    pub ping_ms: Range<u32>,
}

impl Default for SpeedTestConfig {
    fn default() -> Self {
        Self {
            ping_step_ms: 50,
            download_step_ms: 100,
            upload_step_ms: 80,
            download_mbps: 20..100,
            upload_mbps: 5..35,
            ping_ms: 10..60,
        }
    }
}

impl SpeedTestConfig {
    // Same sampling ranges, no delay between steps
    pub fn instant() -> Self {
        Self {
            ping_step_ms: 0,
            download_step_ms: 0,
            upload_step_ms: 0,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("download_mbps", &self.download_mbps),
            ("upload_mbps", &self.upload_mbps),
            ("ping_ms", &self.ping_ms),
        ];

        for (field, range) in ranges {
            if range.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("empty range {}..{}", range.start, range.end),
                });
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub speed_test: SpeedTestConfig,
}

impl AppConfig {
    // Missing sections and fields fall back to their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::JsonParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.picker_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "picker_limit",
                reason: "must be at least 1".to_string(),
            });
        }

        self.speed_test.validate()
    }
}
