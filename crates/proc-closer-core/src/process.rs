use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::CloserResult;

/// Unique identifier for a process
pub type ProcessId = u32;

/// One process record drawn from a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub pid: ProcessId,
    pub parent_pid: Option<ProcessId>,
    /// Executable file name, e.g. `notepad.exe`
    pub exe_name: String,
}

impl ProcessEntry {
    pub fn new(pid: ProcessId, exe_name: impl Into<String>) -> Self {
        Self {
            pid,
            parent_pid: None,
            exe_name: exe_name.into(),
        }
    }

    pub fn with_parent(mut self, parent_pid: ProcessId) -> Self {
        self.parent_pid = Some(parent_pid);
        self
    }
}

/// Result of a process termination operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TerminationResult {
    /// Request was delivered (or the process was terminated)
    Success,
    /// Process was not found (already exited)
    ProcessNotFound,
    /// Insufficient privileges
    AccessDenied,
    /// Process owns no top-level window that could receive a close request
    NoWindow,
    /// Operation failed with specific error message
    Failed(String),
}

impl TerminationResult {
    /// The process is gone or on its way out
    pub fn is_delivered(&self) -> bool {
        matches!(
            self,
            TerminationResult::Success | TerminationResult::ProcessNotFound
        )
    }
}

/// Source of a point-in-time process listing.
///
/// Implementations drain whatever stateful enumeration primitive the
/// platform offers and hand back an owned sequence.
pub trait SnapshotSource {
    fn capture(&self) -> CloserResult<Vec<ProcessEntry>>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for &S {
    fn capture(&self) -> CloserResult<Vec<ProcessEntry>> {
        (**self).capture()
    }
}

/// Platform termination primitives used by [`crate::ProcessCloser::shutdown`]
pub trait Terminator {
    /// Ask every target process to exit on its own terms
    fn request_close(&self, targets: &BTreeSet<ProcessId>) -> BTreeMap<ProcessId, TerminationResult>;

    /// Terminate a single process without its cooperation
    fn force_kill(&self, pid: ProcessId) -> TerminationResult;

    /// Get the platform name for logging and debugging
    fn platform_name(&self) -> &'static str;
}

impl<T: Terminator + ?Sized> Terminator for &T {
    fn request_close(&self, targets: &BTreeSet<ProcessId>) -> BTreeMap<ProcessId, TerminationResult> {
        (**self).request_close(targets)
    }

    fn force_kill(&self, pid: ProcessId) -> TerminationResult {
        (**self).force_kill(pid)
    }

    fn platform_name(&self) -> &'static str {
        (**self).platform_name()
    }
}
