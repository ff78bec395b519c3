//! Configuration for the output sink
//!
//! Two values drive the sink, both static for the lifetime of the process:
//!
//! 1. **`buffer_ms`**: Device buffer depth in milliseconds. Supplied by the
//!    host application; each `open` converts it to a byte capacity for the
//!    negotiated stream format.
//! 2. **`poll_interval_ms`**: Ceiling on how long `wait_for_space`/`drain`
//!    sleep between re-checks of the backend's free space.
//!
//! Loaded from a TOML file when the host provides one; every field has a
//! built-in default so an empty file (or `SinkConfig::default()`) is valid.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Sink configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Device buffer depth in milliseconds
    ///
    /// Default: 500 ms
    #[serde(default = "default_buffer_ms")]
    pub buffer_ms: u32,

    /// Bounded-wait poll ceiling in milliseconds
    ///
    /// Default: 50 ms
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_buffer_ms() -> u32 {
    500
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            buffer_ms: default_buffer_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl SinkConfig {
    /// Parse configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let toml_str = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config = Self::from_toml_str(&toml_str)?;
        info!("Loaded sink configuration from {:?}", path);
        Ok(config)
    }

    /// Poll ceiling as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
