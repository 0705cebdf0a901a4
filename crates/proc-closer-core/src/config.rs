use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{CloserError, CloserResult};

/// How [`crate::ProcessCloser::shutdown`] asks processes to exit and how long it waits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShutdownPolicy {
    /// How long to wait for processes to exit after a close request (in milliseconds)
    #[serde(default = "default_graceful_timeout_ms")]
    pub graceful_timeout_ms: u64,

    /// How long to wait for exit confirmation after a forced kill (in milliseconds)
    #[serde(default = "default_kill_timeout_ms")]
    pub kill_timeout_ms: u64,

    /// Delay between re-checks of the process list while waiting (in milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Whether to ask processes to close before any forced kill
    #[serde(default = "default_request_graceful_close")]
    pub request_graceful_close: bool,
}

impl Default for ShutdownPolicy {
    fn default() -> Self {
        Self {
            graceful_timeout_ms: default_graceful_timeout_ms(),
            kill_timeout_ms: default_kill_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            request_graceful_close: default_request_graceful_close(),
        }
    }
}

impl ShutdownPolicy {
    /// Create a ShutdownPolicy with sensible defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Give applications plenty of time to save state before any kill
    pub fn patient() -> Self {
        Self {
            graceful_timeout_ms: 30_000,
            kill_timeout_ms: 5_000,
            poll_interval_ms: 250,
            request_graceful_close: true,
        }
    }

    /// Skip the close request; only a forced shutdown does anything
    pub fn immediate() -> Self {
        Self {
            graceful_timeout_ms: 0,
            kill_timeout_ms: 2_000,
            poll_interval_ms: 50,
            request_graceful_close: false,
        }
    }

    /// Validate the policy and return errors if invalid
    pub fn validate(&self) -> CloserResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(CloserError::ConfigurationError(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.graceful_timeout_ms > 300_000 || self.kill_timeout_ms > 300_000 {
            return Err(CloserError::ConfigurationError(
                "timeouts should not exceed 5 minutes".to_string(),
            ));
        }

        Ok(())
    }

    pub fn graceful_timeout(&self) -> Duration {
        Duration::from_millis(self.graceful_timeout_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Main closer configuration
#[derive(Default, Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(rename_all = "camelCase")]
pub struct CloserConfig {
    /// Executable names of the target applications
    #[builder(setter(custom))]
    pub names: Vec<String>,
    #[builder(default)]
    #[serde(default)]
    pub policy: ShutdownPolicy,
}

impl CloserConfig {
    pub fn builder() -> CloserConfigBuilder {
        CloserConfigBuilder::default()
    }

    /// Config with default policy for the given executable names
    pub fn for_names<S: ToString, I: IntoIterator<Item = S>>(names: I) -> Self {
        Self {
            names: names.into_iter().map(|s| s.to_string()).collect(),
            policy: ShutdownPolicy::default(),
        }
    }

    pub fn from_json_str(json: &str) -> CloserResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| CloserError::ConfigurationError(format!("invalid closer config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CloserResult<()> {
        if self.names.is_empty() {
            return Err(CloserError::ConfigurationError(
                "at least one executable name is required".to_string(),
            ));
        }

        if self.names.iter().any(|n| n.trim().is_empty()) {
            return Err(CloserError::ConfigurationError(
                "executable names must not be blank".to_string(),
            ));
        }

        self.policy.validate()
    }
}

impl CloserConfigBuilder {
    pub fn names<S: ToString, I: IntoIterator<Item = S>>(&mut self, iter: I) -> &mut Self {
        let names: Vec<String> = iter.into_iter().map(|s| s.to_string()).collect();
        self.names = Some(names);
        self
    }

    pub fn name<S: ToString>(&mut self, name: S) -> &mut Self {
        self.names
            .get_or_insert_with(Vec::new)
            .push(name.to_string());
        self
    }
}

// Default value functions for serde
fn default_graceful_timeout_ms() -> u64 {
    5_000
}
fn default_kill_timeout_ms() -> u64 {
    2_000
}
fn default_poll_interval_ms() -> u64 {
    100
}
fn default_request_graceful_close() -> bool {
    true
}
