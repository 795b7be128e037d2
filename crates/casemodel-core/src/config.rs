//! Runner configuration
//!
//! Values come from code, from a serde source, or from the environment.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Environment variable overriding [`RunnerConfig::max_auto_continuations`]
pub const ENV_MAX_AUTO_CONTINUATIONS: &str = "CASEMODEL_MAX_AUTO_CONTINUATIONS";

/// Environment variable overriding [`RunnerConfig::record_from_start`]
pub const ENV_RECORD: &str = "CASEMODEL_RECORD";

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Ceiling on system-initiated steps run in one call without external input
    #[serde(default = "default_max_auto_continuations")]
    pub max_auto_continuations: usize,

    /// Start recording executed steps when a model is run
    #[serde(default)]
    pub record_from_start: bool,
}

fn default_max_auto_continuations() -> usize {
    100
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_auto_continuations: default_max_auto_continuations(),
            record_from_start: false,
        }
    }
}

impl RunnerConfig {
    /// Defaults overridden by environment variables.
    ///
    /// Unparsable values are logged and ignored; parsable but out of range
    /// values are rejected by [`RunnerConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(max) = env::var(ENV_MAX_AUTO_CONTINUATIONS) {
            if let Ok(max) = max.parse::<usize>() {
                config.max_auto_continuations = max;
            } else {
                warn!("Invalid {} value: {}", ENV_MAX_AUTO_CONTINUATIONS, max);
            }
        }

        if let Ok(record) = env::var(ENV_RECORD) {
            match parse_flag(&record) {
                Some(flag) => config.record_from_start = flag,
                None => warn!("Invalid {} value: {}", ENV_RECORD, record),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_auto_continuations == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_auto_continuations".to_string(),
                value: self.max_auto_continuations.to_string(),
            });
        }
        Ok(())
    }
}

pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
