use crate::process::ProcessId;
use thiserror::Error;

/// Core error types for process discovery and termination
#[derive(Error, Debug)]
pub enum CloserError {
    #[error("Invalid handle: raw value equals the platform's invalid sentinel")]
    InvalidHandle,

    #[error("Failed to open process snapshot: {0}")]
    SnapshotOpenFailed(String),

    #[error("Failed to advance process snapshot: {0}")]
    SnapshotAdvanceFailed(String),

    #[error("Failed to look up the owner of a window (platform error code {code})")]
    OwnerLookupFailed { code: u32 },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Processes still running after shutdown: {pids:?}")]
    StillRunning { pids: Vec<ProcessId> },

    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result alias used across the closer crates
pub type CloserResult<T> = std::result::Result<T, CloserError>;

impl CloserError {
    /// Check if retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CloserError::SnapshotOpenFailed(_)
                | CloserError::SnapshotAdvanceFailed(_)
                | CloserError::StillRunning { .. }
        )
    }

    /// Check if this error indicates a caller or build problem that retrying cannot fix
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            CloserError::InvalidHandle
                | CloserError::ConfigurationError(_)
                | CloserError::NotImplemented(_)
        )
    }
}
