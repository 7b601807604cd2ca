//! Process configuration.
//!
//! Configuration can be loaded from:
//! - TOML configuration file
//! - Environment variables (TALLY_*)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;
use tally_protocol::{Format, ValueMap};
use tenvis_tally_core::settings::keys;

/// Environment variable supplying the vendor token.
pub const TOKEN_ENV: &str = "TALLY_TOKEN";

/// Process configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Raw integration settings bundle, handed to the router verbatim.
    #[serde(default)]
    pub integration: Map<String, Value>,

    /// Event stream configuration.
    #[serde(default)]
    pub input: InputConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Record vendor calls instead of logging them, and print them at exit.
    #[serde(default)]
    pub dry_run: bool,
}

/// Event stream configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Framing of events on stdin.
    #[serde(default)]
    pub format: Format,

    /// Vendor flush interval in milliseconds.
    #[serde(default = "default_flush_interval")]
    pub flush_interval_ms: u64,

    /// Maximum bytes buffered while waiting for a complete frame.
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable metrics export.
    #[serde(default)]
    pub enabled: bool,

    /// Metrics port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_flush_interval() -> u64 {
    std::env::var("TALLY_FLUSH_INTERVAL_MS")
        .ok()
        .and_then(|ms| ms.parse().ok())
        .unwrap_or(10_000) // 10 seconds
}

fn default_max_buffer_size() -> usize {
    1024 * 1024 // 1 MB
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            format: Format::default(),
            flush_interval_ms: default_flush_interval(),
            max_buffer_size: default_max_buffer_size(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from file or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "tally.toml",
            "/etc/tally/tally.toml",
            "~/.config/tally/tally.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// The settings bundle, with the token taken from the environment when
    /// the file has none.
    #[must_use]
    pub fn bundle(&self) -> ValueMap {
        self.bundle_with_token(std::env::var(TOKEN_ENV).ok())
    }

    fn bundle_with_token(&self, fallback: Option<String>) -> ValueMap {
        let mut bundle = ValueMap::from(self.integration.clone());
        if !bundle.contains_key(keys::TOKEN) {
            if let Some(token) = fallback {
                bundle.insert(keys::TOKEN, token);
            }
        }
        bundle
    }
}

impl InputConfig {
    /// The flush interval as a duration.
    ///
    /// Zero is raised to one millisecond.
    #[must_use]
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }
}
