//! Configuration for the coordination emulator.
//!
//! Provides hierarchical configuration loading and validation with:
//! - Default values as code base
//! - Configuration file support
//! - Environment variable overrides


use std::env;
use std::time::Duration;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::CONFIG_ENV_PREFIX;
use crate::constants::CONFIG_PATH_ENV;
use crate::constants::DEFAULT_OPERATION_TIMEOUT_MS;
use crate::constants::DEFAULT_REQUEST_QUEUE_CAPACITY;
use crate::Error;
use crate::Result;

/// Engine construction parameters.
///
/// Merge order (later sources override earlier ones):
/// 1. Type defaults (lowest priority)
/// 2. Configuration file from the `CONFIG_PATH` environment variable
/// 3. Environment variables with the `KEEPER__` prefix (highest priority)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct KeeperConfig {
    /// Prefix applied to every request path on the way into processing and
    /// stripped on the way out. Empty disables rewriting; a trailing `/`
    /// is dropped.
    #[serde(default)]
    pub root_path: String,

    /// Façade push timeout in milliseconds
    #[serde(default = "default_operation_timeout_in_ms")]
    pub operation_timeout_in_ms: u64,

    /// Bound of the pending-request queue
    #[serde(default = "default_request_queue_capacity")]
    pub request_queue_capacity: usize,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            root_path: String::new(),
            operation_timeout_in_ms: default_operation_timeout_in_ms(),
            request_queue_capacity: default_request_queue_capacity(),
        }
    }
}

impl KeeperConfig {
    /// Loads configuration with hierarchical override support.
    ///
    /// # Errors
    /// Fails if the `CONFIG_PATH` file cannot be parsed, an override has
    /// the wrong shape, or validation rejects the merged result.
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&KeeperConfig::default())?);

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            builder = builder.add_source(File::with_name(&config_path));
        }

        builder = builder.add_source(
            Environment::with_prefix(CONFIG_ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: KeeperConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy with settings from `config_path` merged over `self`.
    pub fn with_override_config(&self, config_path: &str) -> Result<Self> {
        let merged = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(config_path))
            .build()?;

        let config: KeeperConfig = merged.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates all engine parameters.
    pub fn validate(&self) -> Result<()> {
        if self.operation_timeout_in_ms == 0 {
            return Err(Error::InvalidConfig(
                "operation_timeout_in_ms must be at least 1ms".into(),
            ));
        }

        if self.request_queue_capacity == 0 {
            return Err(Error::InvalidConfig(
                "request_queue_capacity must be greater than 0".into(),
            ));
        }

        if !self.root_path.is_empty() && !self.root_path.starts_with('/') {
            return Err(Error::InvalidConfig(
                "root_path must be empty or start with '/'".into(),
            ));
        }

        Ok(())
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_in_ms)
    }

    /// The root prefix as applied to request paths: trailing `/` removed.
    pub(crate) fn normalized_root_path(&self) -> String {
        let mut root_path = self.root_path.clone();
        if root_path.ends_with('/') {
            root_path.pop();
        }
        root_path
    }
}

fn default_operation_timeout_in_ms() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_MS
}

fn default_request_queue_capacity() -> usize {
    DEFAULT_REQUEST_QUEUE_CAPACITY
}
