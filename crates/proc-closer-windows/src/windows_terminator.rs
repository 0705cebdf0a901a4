#[cfg(windows)]
mod windows_impl {
    use crate::top_windows::{EnumWindowsSource, WindowCreatorLookup, to_hwnd};
    use crate::win_handle::OwnedWin32Handle;
    use proc_closer_core::{
        CloserError, CloserResult, ProcessId, ProcessOwnerLookup, TerminationResult, Terminator,
        WindowEnumerationStatus, WindowEnumerator,
    };
    use std::collections::{BTreeMap, BTreeSet};
    use tracing::{debug, info, warn};
    use windows::Win32::Foundation::{
        ERROR_ACCESS_DENIED, ERROR_INVALID_PARAMETER, HANDLE, LPARAM, WPARAM,
    };
    use windows::Win32::System::Threading::{
        GetExitCodeProcess, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_TERMINATE,
        TerminateProcess,
    };
    use windows::Win32::UI::WindowsAndMessaging::{PostMessageW, WM_CLOSE};

    /// Exit code given to processes killed by [`WindowsTerminator::force_kill`]
    const FORCED_EXIT_CODE: u32 = 1;

    /// Exit code `GetExitCodeProcess` reports while a process runs
    const STILL_ACTIVE: u32 = 259;

    /// Closes processes by posting `WM_CLOSE` to their top-level windows,
    /// and kills them with `TerminateProcess`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WindowsTerminator;

    impl WindowsTerminator {
        pub fn new() -> Self {
            Self
        }

        fn map_error(pid: ProcessId, e: &windows::core::Error) -> TerminationResult {
            if e.code() == ERROR_ACCESS_DENIED.to_hresult() {
                warn!(pid = %pid, "Access denied to terminate process");
                TerminationResult::AccessDenied
            } else if e.code() == ERROR_INVALID_PARAMETER.to_hresult() {
                // OpenProcess reports an unknown pid this way
                info!(pid = %pid, "Process not found (already terminated)");
                TerminationResult::ProcessNotFound
            } else {
                warn!(pid = %pid, error = %e, "Failed to terminate process");
                TerminationResult::Failed(e.to_string())
            }
        }

        /// Whether the process behind `handle` has exited. Its pid stays
        /// valid while any handle to it is open.
        fn has_exited(handle: HANDLE) -> bool {
            let mut code = 0u32;
            unsafe { GetExitCodeProcess(handle, &mut code) }.is_ok() && code != STILL_ACTIVE
        }
    }

    impl Terminator for WindowsTerminator {
        fn request_close(
            &self,
            targets: &BTreeSet<ProcessId>,
        ) -> BTreeMap<ProcessId, TerminationResult> {
            let lookup = WindowCreatorLookup;
            let mut posted: BTreeMap<ProcessId, TerminationResult> = BTreeMap::new();

            let mut enumerator = WindowEnumerator::new(EnumWindowsSource);
            let status = enumerator.run(|window| -> CloserResult<bool> {
                let owner = match lookup.owner_of(window) {
                    Ok(pid) => pid,
                    Err(CloserError::OwnerLookupFailed { code }) => {
                        // Window destroyed since it was listed
                        debug!(window = ?window, code, "Skipping window without owner");
                        return Ok(true);
                    }
                    Err(e) => return Err(e),
                };
                if !targets.contains(&owner) {
                    return Ok(true);
                }

                let result =
                    match unsafe { PostMessageW(Some(to_hwnd(window)), WM_CLOSE, WPARAM(0), LPARAM(0)) } {
                        Ok(()) => {
                            debug!(pid = %owner, window = ?window, "Posted WM_CLOSE");
                            TerminationResult::Success
                        }
                        Err(e) => Self::map_error(owner, &e),
                    };
                // One delivered message is enough for the process
                posted
                    .entry(owner)
                    .and_modify(|r| {
                        if !r.is_delivered() {
                            *r = result.clone();
                        }
                    })
                    .or_insert(result);
                Ok(true)
            });

            if status != WindowEnumerationStatus::Completed {
                warn!(
                    status = ?status,
                    failure = ?enumerator.failure(),
                    "Window enumeration for close requests did not complete"
                );
            }

            targets
                .iter()
                .map(|pid| {
                    let result = posted.remove(pid).unwrap_or(TerminationResult::NoWindow);
                    (*pid, result)
                })
                .collect()
        }

        fn force_kill(&self, pid: ProcessId) -> TerminationResult {
            let access = PROCESS_TERMINATE | PROCESS_QUERY_LIMITED_INFORMATION;
            let raw = match unsafe { OpenProcess(access, false, pid) } {
                Ok(raw) => raw,
                Err(e) => return Self::map_error(pid, &e),
            };
            let process = match OwnedWin32Handle::new(raw) {
                Ok(process) => process,
                Err(e) => return TerminationResult::Failed(e.to_string()),
            };
            let Some(handle) = process.as_raw() else {
                return TerminationResult::Failed("process handle not open".to_string());
            };

            match unsafe { TerminateProcess(handle, FORCED_EXIT_CODE) } {
                Ok(()) => {
                    info!(pid = %pid, "Terminated process");
                    TerminationResult::Success
                }
                // TerminateProcess is denied on a process that already exited
                Err(e)
                    if e.code() == ERROR_ACCESS_DENIED.to_hresult() && Self::has_exited(handle) =>
                {
                    info!(pid = %pid, "Process not found (already terminated)");
                    TerminationResult::ProcessNotFound
                }
                Err(e) => Self::map_error(pid, &e),
            }
        }

        fn platform_name(&self) -> &'static str {
            "Windows"
        }
    }

}

#[cfg(windows)]
pub use windows_impl::WindowsTerminator;
