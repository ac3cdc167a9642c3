use crate::core::{DesiredAccuracy, DEFAULT_GET_LOCATION_TIMEOUT_MS, MIN_RANGE_UPDATE_M, MIN_TIME_UPDATE_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Defaults applied to every request that leaves an option unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationConfig {
    /// Live-path timeout when the request sets none (milliseconds)
    pub default_timeout_ms: u64,
    /// Interval between updates (milliseconds)
    pub update_time_ms: u64,
    /// Minimum interval between updates (milliseconds)
    pub minimum_update_time_ms: u64,
    /// Distance filter between updates (meters)
    pub update_distance_m: f64,
    /// Accuracy tier when the request sets none
    pub default_accuracy: DesiredAccuracy,
    /// Prompt for access before failing a live request with `ServiceDisabled`
    pub prompt_for_authorization: bool,
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: DEFAULT_GET_LOCATION_TIMEOUT_MS,
            update_time_ms: MIN_TIME_UPDATE_MS,
            minimum_update_time_ms: MIN_TIME_UPDATE_MS,
            update_distance_m: MIN_RANGE_UPDATE_M,
            default_accuracy: DesiredAccuracy::High,
            prompt_for_authorization: true,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Invalid parameter value
    #[error("Invalid parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    /// File I/O error
    #[error("I/O error: {message}")]
    Io { message: String },
    /// JSON serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl GeolocationConfig {
    /// Load and validate configuration from a JSON file
    ///
    /// Keys missing from the file keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Io {
            message: format!("Failed to read config file '{}': {}", path_str, e),
        })?;

        let config: GeolocationConfig = serde_json::from_str(&content).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to parse config file '{}': {}", path_str, e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let content = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialization {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(&path, content).map_err(|e| ConfigError::Io {
            message: format!("Failed to write config file '{}': {}", path_str, e),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_timeout_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "default_timeout_ms".to_string(),
                value: self.default_timeout_ms.to_string(),
                reason: "a zero default would turn every request into a cache lookup".to_string(),
            });
        }

        if !self.update_distance_m.is_finite() || self.update_distance_m < 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "update_distance_m".to_string(),
                value: self.update_distance_m.to_string(),
                reason: "distance filter must be a non-negative number of meters".to_string(),
            });
        }

        if self.minimum_update_time_ms > self.update_time_ms {
            return Err(ConfigError::InvalidParameter {
                parameter: "minimum_update_time_ms".to_string(),
                value: self.minimum_update_time_ms.to_string(),
                reason: format!("must not exceed update_time_ms ({})", self.update_time_ms),
            });
        }

        Ok(())
    }
}
