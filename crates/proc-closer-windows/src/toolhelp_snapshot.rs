#[cfg(windows)]
mod windows_impl {
    use crate::win_handle::OwnedWin32Handle;
    use anyhow::Context;
    use proc_closer_core::{CloserError, CloserResult, ProcessEntry, SnapshotSource};
    use std::mem;
    use tracing::debug;
    use windows::Win32::Foundation::ERROR_NO_MORE_FILES;
    use windows::Win32::System::Diagnostics::ToolHelp::{
        CreateToolhelp32Snapshot, PROCESSENTRY32W, Process32FirstW, Process32NextW,
        TH32CS_SNAPPROCESS,
    };

    /// Process listing taken with `CreateToolhelp32Snapshot`.
    ///
    /// `Process32FirstW`/`Process32NextW` keep their position inside the
    /// snapshot object, so the whole listing is drained in one pass while
    /// the handle is held.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct ToolhelpSnapshotSource;

    impl ToolhelpSnapshotSource {
        pub fn new() -> Self {
            Self
        }
    }

    fn to_entry(raw: &PROCESSENTRY32W) -> ProcessEntry {
        let len = raw
            .szExeFile
            .iter()
            .position(|c| *c == 0)
            .unwrap_or(raw.szExeFile.len());
        ProcessEntry {
            pid: raw.th32ProcessID,
            parent_pid: Some(raw.th32ParentProcessID),
            exe_name: String::from_utf16_lossy(&raw.szExeFile[..len]),
        }
    }

    impl SnapshotSource for ToolhelpSnapshotSource {
        fn capture(&self) -> CloserResult<Vec<ProcessEntry>> {
            let raw = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) }
                .context("CreateToolhelp32Snapshot failed")
                .map_err(|e| CloserError::SnapshotOpenFailed(format!("{e:#}")))?;
            let snapshot = OwnedWin32Handle::new(raw)?;
            let handle = snapshot.as_raw().ok_or(CloserError::InvalidHandle)?;

            let mut buffer = PROCESSENTRY32W {
                dwSize: mem::size_of::<PROCESSENTRY32W>() as u32,
                ..Default::default()
            };
            let mut entries = Vec::new();

            let mut step = unsafe { Process32FirstW(handle, &mut buffer) };
            loop {
                match step {
                    Ok(()) => entries.push(to_entry(&buffer)),
                    Err(e) if e.code() == ERROR_NO_MORE_FILES.to_hresult() => break,
                    Err(e) => return Err(CloserError::SnapshotAdvanceFailed(e.to_string())),
                }
                step = unsafe { Process32NextW(handle, &mut buffer) };
            }

            debug!(count = entries.len(), "Captured ToolHelp process listing");
            Ok(entries)
        }
    }

}

#[cfg(windows)]
pub use windows_impl::ToolhelpSnapshotSource;
