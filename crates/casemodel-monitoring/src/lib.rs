//! Monitoring for casemodel runners: logging setup, reaction tracing and a
//! small metrics interface.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::env;
use tracing::warn;

/// Structured logging
pub mod logging;

/// Metrics collection
pub mod metrics;

/// Reaction tracing hook
pub mod reaction;

pub use logging::init_logging;
pub use metrics::{InMemoryMetrics, MetricSample, MetricType, MetricsCollector};
pub use reaction::TracedReaction;

/// Environment variable overriding [`MonitoringConfig::log_filter`]
pub const ENV_LOG: &str = "CASEMODEL_LOG";

/// Environment variable overriding [`MonitoringConfig::json`]
pub const ENV_LOG_JSON: &str = "CASEMODEL_LOG_JSON";

/// Configuration for logging and tracing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Service name attached to log output
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Log level filter (e.g., "info,casemodel_core=debug")
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Emit JSON instead of pretty logs
    #[serde(default)]
    pub json: bool,
}

fn default_service_name() -> String {
    "casemodel".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_filter: default_log_filter(),
            json: false,
        }
    }
}

impl MonitoringConfig {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(filter) = env::var(ENV_LOG) {
            config.log_filter = filter;
        }

        if let Ok(json) = env::var(ENV_LOG_JSON) {
            match json.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => config.json = true,
                "0" | "false" | "no" | "off" => config.json = false,
                _ => warn!("Invalid {} value: {}", ENV_LOG_JSON, json),
            }
        }

        config
    }

    /// Use `service_name`
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }
}
