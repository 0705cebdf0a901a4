use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::collect::CollectionBuilder;
use crate::config::{CloserConfig, ShutdownPolicy};
use crate::error::{CloserError, CloserResult};
use crate::names::{NameSet, copy_pid};
use crate::process::{ProcessEntry, ProcessId, SnapshotSource, TerminationResult, Terminator};
use crate::snapshot::ProcessSnapshot;

/// How a successful shutdown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownOutcome {
    /// No target process was running
    NotRunning,
    /// Every target exited after the close request
    ClosedGracefully,
    /// At least one target had to be killed
    ForceKilled,
}

/// What [`ProcessCloser::shutdown`] did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub outcome: ShutdownOutcome,
    /// Targets found running when the shutdown started
    pub targets: BTreeSet<ProcessId>,
    /// Per-process result of the close request
    pub close_requests: BTreeMap<ProcessId, TerminationResult>,
    /// Per-process result of the forced kill
    pub kills: BTreeMap<ProcessId, TerminationResult>,
}

/// Finds running instances of a fixed set of executables and closes them.
///
/// The matching process ids reflect the last successful
/// [`refresh`](Self::refresh); nothing is re-checked live.
pub struct ProcessCloser<S: SnapshotSource, T: Terminator> {
    names: NameSet,
    policy: ShutdownPolicy,
    snapshot: ProcessSnapshot<S>,
    pid_set: BTreeSet<ProcessId>,
    terminator: T,
}

impl<S: SnapshotSource, T: Terminator> ProcessCloser<S, T> {
    /// Validate `config`, take the initial snapshot and match it
    pub fn new(config: CloserConfig, source: S, terminator: T) -> CloserResult<Self> {
        config.validate()?;
        let names = NameSet::new(&config.names);
        let snapshot = ProcessSnapshot::open(source)?;

        let mut closer = Self {
            names,
            policy: config.policy,
            snapshot,
            pid_set: BTreeSet::new(),
            terminator,
        };
        closer.pid_set = closer.matching_pids();
        let targets: Vec<&str> = closer.names.iter().collect();
        info!(
            names = ?targets,
            running = closer.pid_set.len(),
            platform = closer.terminator.platform_name(),
            "Created process closer"
        );
        Ok(closer)
    }

    /// Take a new snapshot and rebuild the set of matching process ids.
    ///
    /// On failure the previous set is left untouched.
    pub fn refresh(&mut self) -> CloserResult<()> {
        self.snapshot.refresh()?;
        self.pid_set = self.matching_pids();
        debug!(pids = ?self.pid_set, "Refreshed matching processes");
        Ok(())
    }

    /// Whether any target was running at the last refresh
    pub fn is_running(&self) -> bool {
        !self.pid_set.is_empty()
    }

    pub fn pids(&self) -> &BTreeSet<ProcessId> {
        &self.pid_set
    }

    pub fn names(&self) -> &NameSet {
        &self.names
    }

    pub fn policy(&self) -> &ShutdownPolicy {
        &self.policy
    }

    pub fn snapshot(&self) -> &ProcessSnapshot<S> {
        &self.snapshot
    }

    /// Close every running target.
    ///
    /// Targets are first asked to close (unless the policy disables it)
    /// and given `graceful_timeout` to exit. Without `force` any survivor
    /// is reported as [`CloserError::StillRunning`]. With `force` the
    /// survivors are killed and given `kill_timeout` to disappear from
    /// the process list.
    pub fn shutdown(&mut self, force: bool) -> CloserResult<ShutdownReport> {
        self.refresh()?;
        let mut report = ShutdownReport {
            outcome: ShutdownOutcome::NotRunning,
            targets: self.pid_set.clone(),
            close_requests: BTreeMap::new(),
            kills: BTreeMap::new(),
        };

        if !self.is_running() {
            info!("No target processes running, nothing to shut down");
            return Ok(report);
        }

        if self.policy.request_graceful_close {
            info!(pids = ?self.pid_set, "Requesting targets to close");
            report.close_requests = self.terminator.request_close(&self.pid_set);
            for (pid, result) in &report.close_requests {
                if !result.is_delivered() {
                    warn!(pid = %pid, result = ?result, "Close request not delivered");
                }
            }

            if !self.wait_for_exit(self.policy.graceful_timeout())? {
                report.outcome = ShutdownOutcome::ClosedGracefully;
                info!(targets = report.targets.len(), "All targets closed gracefully");
                return Ok(report);
            }
        }

        if !force {
            warn!(pids = ?self.pid_set, "Targets still running and force not requested");
            return Err(self.still_running());
        }

        let survivors: Vec<ProcessId> = self.pid_set.iter().copied().collect();
        for pid in survivors {
            let result = self.terminator.force_kill(pid);
            if result.is_delivered() {
                info!(pid = %pid, "Force killed process");
            } else {
                warn!(pid = %pid, result = ?result, "Failed to force kill process");
            }
            report.kills.insert(pid, result);
        }

        if self.wait_for_exit(self.policy.kill_timeout())? {
            warn!(pids = ?self.pid_set, "Targets survived forced kill");
            return Err(self.still_running());
        }

        report.outcome = ShutdownOutcome::ForceKilled;
        info!(killed = report.kills.len(), "Targets shut down by force");
        Ok(report)
    }

    fn matching_pids(&self) -> BTreeSet<ProcessId> {
        let names = &self.names;
        CollectionBuilder::new(|e: &ProcessEntry| names.matches_any(e), copy_pid)
            .build_set(&self.snapshot)
    }

    /// Poll until no target is running or `timeout` elapses. Returns
    /// whether targets are still running.
    fn wait_for_exit(&mut self, timeout: Duration) -> CloserResult<bool> {
        let deadline = Instant::now() + timeout;
        let interval = self.policy.poll_interval();
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(interval.min(deadline - now));
            self.refresh()?;
        }
        Ok(self.is_running())
    }

    fn still_running(&self) -> CloserError {
        CloserError::StillRunning {
            pids: self.pid_set.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::tests::ScriptedSource;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Process table shared between the fake source and the fake terminator
    #[derive(Clone, Default)]
    struct FakeSystem {
        processes: Rc<RefCell<Vec<ProcessEntry>>>,
        /// Processes that ignore close requests
        stubborn: Rc<RefCell<BTreeSet<ProcessId>>>,
        /// Processes that survive kills
        unkillable: Rc<RefCell<BTreeSet<ProcessId>>>,
        fail_capture: Rc<RefCell<bool>>,
        kill_calls: Rc<RefCell<Vec<ProcessId>>>,
    }

    impl FakeSystem {
        fn with(entries: Vec<ProcessEntry>) -> Self {
            let system = Self::default();
            *system.processes.borrow_mut() = entries;
            system
        }

        fn remove(&self, pid: ProcessId) {
            self.processes.borrow_mut().retain(|e| e.pid != pid);
        }
    }

    impl SnapshotSource for FakeSystem {
        fn capture(&self) -> CloserResult<Vec<ProcessEntry>> {
            if *self.fail_capture.borrow() {
                return Err(CloserError::SnapshotOpenFailed("denied".to_string()));
            }
            Ok(self.processes.borrow().clone())
        }
    }

    impl Terminator for FakeSystem {
        fn request_close(
            &self,
            targets: &BTreeSet<ProcessId>,
        ) -> BTreeMap<ProcessId, TerminationResult> {
            targets
                .iter()
                .map(|pid| {
                    if self.stubborn.borrow().contains(pid) {
                        (*pid, TerminationResult::NoWindow)
                    } else {
                        self.remove(*pid);
                        (*pid, TerminationResult::Success)
                    }
                })
                .collect()
        }

        fn force_kill(&self, pid: ProcessId) -> TerminationResult {
            self.kill_calls.borrow_mut().push(pid);
            if self.unkillable.borrow().contains(&pid) {
                return TerminationResult::AccessDenied;
            }
            self.remove(pid);
            TerminationResult::Success
        }

        fn platform_name(&self) -> &'static str {
            "fake"
        }
    }

    fn fast_policy() -> ShutdownPolicy {
        ShutdownPolicy {
            graceful_timeout_ms: 20,
            kill_timeout_ms: 20,
            poll_interval_ms: 1,
            request_graceful_close: true,
        }
    }

    fn closer_for(names: &[&str], system: &FakeSystem) -> ProcessCloser<FakeSystem, FakeSystem> {
        let config = CloserConfig {
            names: names.iter().map(|n| n.to_string()).collect(),
            policy: fast_policy(),
        };
        ProcessCloser::new(config, system.clone(), system.clone()).unwrap()
    }

    fn desktop() -> Vec<ProcessEntry> {
        vec![
            ProcessEntry::new(4, "System"),
            ProcessEntry::new(100, "EXPLORER.EXE"),
            ProcessEntry::new(200, "svchost.exe"),
        ]
    }

    #[test]
    fn test_matching_process_is_running() {
        let system = FakeSystem::with(desktop());
        let mut closer = closer_for(&["explorer.exe"], &system);
        closer.refresh().unwrap();

        assert!(closer.is_running());
        assert_eq!(closer.pids(), &BTreeSet::from([100]));
    }

    #[test]
    fn test_absent_process_is_not_running() {
        let system = FakeSystem::with(desktop());
        let mut closer = closer_for(&["foo.exe"], &system);
        closer.refresh().unwrap();

        assert!(!closer.is_running());
        assert!(closer.pids().is_empty());
    }

    #[test]
    fn test_is_running_reflects_last_refresh_only() {
        let system = FakeSystem::with(desktop());
        let mut closer = closer_for(&["explorer.exe"], &system);
        assert!(closer.is_running());

        system.remove(100);
        assert!(closer.is_running());

        closer.refresh().unwrap();
        assert!(!closer.is_running());
    }

    #[test]
    fn test_failed_refresh_keeps_previous_set() {
        let system = FakeSystem::with(desktop());
        let mut closer = closer_for(&["explorer.exe"], &system);

        system.remove(100);
        *system.fail_capture.borrow_mut() = true;
        assert!(matches!(
            closer.refresh(),
            Err(CloserError::SnapshotOpenFailed(_))
        ));
        assert_eq!(closer.pids(), &BTreeSet::from([100]));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let system = FakeSystem::with(desktop());
        let result = ProcessCloser::new(
            CloserConfig::for_names(Vec::<String>::new()),
            system.clone(),
            system,
        );
        assert!(matches!(result, Err(CloserError::ConfigurationError(_))));
    }

    #[test]
    fn test_new_propagates_snapshot_failure() {
        let source = ScriptedSource::new(vec![Err(CloserError::SnapshotOpenFailed(
            "denied".to_string(),
        ))]);
        let result = ProcessCloser::new(
            CloserConfig::for_names(["a.exe"]),
            source,
            FakeSystem::default(),
        );
        assert!(matches!(result, Err(CloserError::SnapshotOpenFailed(_))));
    }

    #[test]
    fn test_shutdown_with_nothing_running() {
        let system = FakeSystem::with(desktop());
        let mut closer = closer_for(&["foo.exe"], &system);

        let report = closer.shutdown(false).unwrap();
        assert_eq!(report.outcome, ShutdownOutcome::NotRunning);
        assert!(report.close_requests.is_empty());
    }

    #[test]
    fn test_shutdown_closes_gracefully() {
        let mut entries = desktop();
        entries.push(ProcessEntry::new(300, "iexplore.exe"));
        entries.push(ProcessEntry::new(301, "IEXPLORE.EXE"));
        let system = FakeSystem::with(entries);
        let mut closer = closer_for(&["iexplore.exe"], &system);

        let report = closer.shutdown(false).unwrap();
        assert_eq!(report.outcome, ShutdownOutcome::ClosedGracefully);
        assert_eq!(report.targets, BTreeSet::from([300, 301]));
        assert!(report.kills.is_empty());
        assert!(!closer.is_running());
        assert!(system.kill_calls.borrow().is_empty());
    }

    #[test]
    fn test_shutdown_without_force_reports_survivors() {
        let system = FakeSystem::with(desktop());
        system.stubborn.borrow_mut().insert(100);
        let mut closer = closer_for(&["explorer.exe"], &system);

        let result = closer.shutdown(false);
        match result {
            Err(CloserError::StillRunning { pids }) => assert_eq!(pids, vec![100]),
            other => panic!("expected StillRunning, got {other:?}"),
        }
        assert!(system.kill_calls.borrow().is_empty());
    }

    #[test]
    fn test_shutdown_with_force_kills_survivors() {
        let mut entries = desktop();
        entries.push(ProcessEntry::new(300, "iexplore.exe"));
        let system = FakeSystem::with(entries);
        system.stubborn.borrow_mut().insert(100);
        let mut closer = closer_for(&["explorer.exe", "iexplore.exe"], &system);

        let report = closer.shutdown(true).unwrap();
        assert_eq!(report.outcome, ShutdownOutcome::ForceKilled);
        assert_eq!(report.close_requests[&100], TerminationResult::NoWindow);
        assert_eq!(report.close_requests[&300], TerminationResult::Success);
        assert_eq!(*system.kill_calls.borrow(), vec![100]);
        assert!(!closer.is_running());
    }

    #[test]
    fn test_forced_shutdown_fails_when_kill_does_not_take() {
        let system = FakeSystem::with(desktop());
        system.stubborn.borrow_mut().insert(100);
        system.unkillable.borrow_mut().insert(100);
        let mut closer = closer_for(&["explorer.exe"], &system);

        let result = closer.shutdown(true);
        assert!(matches!(result, Err(CloserError::StillRunning { .. })));
    }

    #[test]
    fn test_immediate_policy_skips_close_request() {
        let system = FakeSystem::with(desktop());
        let config = CloserConfig {
            names: vec!["explorer.exe".to_string()],
            policy: ShutdownPolicy {
                kill_timeout_ms: 20,
                poll_interval_ms: 1,
                ..ShutdownPolicy::immediate()
            },
        };
        let mut closer = ProcessCloser::new(config, system.clone(), system.clone()).unwrap();

        let report = closer.shutdown(true).unwrap();
        assert!(report.close_requests.is_empty());
        assert_eq!(report.outcome, ShutdownOutcome::ForceKilled);
        assert_eq!(*system.kill_calls.borrow(), vec![100]);
    }

    #[test]
    fn test_immediate_policy_without_force_does_nothing() {
        let system = FakeSystem::with(desktop());
        let config = CloserConfig {
            names: vec!["explorer.exe".to_string()],
            policy: ShutdownPolicy::immediate(),
        };
        let mut closer = ProcessCloser::new(config, system.clone(), system.clone()).unwrap();

        assert!(matches!(
            closer.shutdown(false),
            Err(CloserError::StillRunning { .. })
        ));
        assert!(system.kill_calls.borrow().is_empty());
    }
}
