use proc_closer_core::{ProcessId, TerminationResult, Terminator};
use std::collections::{BTreeMap, BTreeSet};

#[cfg(unix)]
mod unix_impl {
    use super::*;
    use anyhow::{Context, Result, bail};
    use nix::errno::Errno;
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid as NixPid;
    use tracing::{info, warn};

    /// Terminates processes with POSIX signals: `SIGTERM` to ask, `SIGKILL` to force
    #[derive(Debug, Default, Clone, Copy)]
    pub struct SignalTerminator;

    impl SignalTerminator {
        pub fn new() -> Self {
            Self
        }

        fn target(pid: ProcessId) -> Result<NixPid> {
            let raw = i32::try_from(pid).with_context(|| format!("pid {pid} out of range"))?;
            // pid 0 and negatives address process groups
            if raw <= 0 {
                bail!("refusing to signal pid {pid}");
            }
            Ok(NixPid::from_raw(raw))
        }

        fn send(&self, pid: ProcessId, sig: Signal) -> TerminationResult {
            let target = match Self::target(pid) {
                Ok(target) => target,
                Err(e) => return TerminationResult::Failed(format!("{e:#}")),
            };

            match signal::kill(target, sig) {
                Ok(()) => {
                    info!(pid = %pid, signal = %sig, "Sent signal to process");
                    TerminationResult::Success
                }
                Err(Errno::ESRCH) => {
                    info!(pid = %pid, "Process not found (already terminated)");
                    TerminationResult::ProcessNotFound
                }
                Err(Errno::EPERM) => {
                    warn!(pid = %pid, signal = %sig, "Permission denied to signal process");
                    TerminationResult::AccessDenied
                }
                Err(e) => {
                    warn!(pid = %pid, signal = %sig, error = %e, "Failed to signal process");
                    TerminationResult::Failed(format!("{sig} failed: {e}"))
                }
            }
        }
    }

    impl Terminator for SignalTerminator {
        fn request_close(
            &self,
            targets: &BTreeSet<ProcessId>,
        ) -> BTreeMap<ProcessId, TerminationResult> {
            targets
                .iter()
                .map(|pid| (*pid, self.send(*pid, Signal::SIGTERM)))
                .collect()
        }

        fn force_kill(&self, pid: ProcessId) -> TerminationResult {
            self.send(pid, Signal::SIGKILL)
        }

        fn platform_name(&self) -> &'static str {
            "Unix"
        }
    }
}

#[cfg(unix)]
pub use unix_impl::SignalTerminator;
