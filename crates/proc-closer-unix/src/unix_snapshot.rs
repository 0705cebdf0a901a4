use proc_closer_core::{CloserError, CloserResult, ProcessEntry, SnapshotSource};
use std::path::Path;
use sysinfo::{ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System, UpdateKind};
use tracing::debug;

/// Suffix Linux appends to `/proc/<pid>/exe` once the binary is unlinked
const DELETED_SUFFIX: &str = " (deleted)";

/// Longest process name the kernel keeps (`TASK_COMM_LEN - 1`)
const COMM_MAX_LEN: usize = 15;

/// Process listing backed by `sysinfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoSnapshotSource;

impl SysinfoSnapshotSource {
    pub fn new() -> Self {
        Self
    }
}

/// File name of `path`, without the marker of a deleted binary
fn exe_file_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    let name = name.strip_suffix(DELETED_SUFFIX).unwrap_or(&name);
    (!name.is_empty()).then(|| name.to_string())
}

/// Complete a kernel process name cut to 15 bytes from `argv[0]`
fn complete_comm(comm: String, arg0: Option<&Path>) -> String {
    if comm.len() < COMM_MAX_LEN {
        return comm;
    }
    arg0.and_then(exe_file_name)
        .filter(|full| full.starts_with(&comm))
        .unwrap_or(comm)
}

/// Name of the executable a process runs.
///
/// Taken from the executable path. When that is unreadable (processes of
/// other users), the kernel name is used, completed from `argv[0]` when
/// the kernel cut it short.
fn exe_name(process: &sysinfo::Process) -> String {
    if let Some(name) = process.exe().and_then(exe_file_name) {
        return name;
    }

    let comm = process.name().to_string_lossy().into_owned();
    complete_comm(comm, process.cmd().first().map(Path::new))
}

impl SnapshotSource for SysinfoSnapshotSource {
    fn capture(&self) -> CloserResult<Vec<ProcessEntry>> {
        let mut system = System::new();
        let refreshed = system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing()
                .with_exe(UpdateKind::OnlyIfNotSet)
                .with_cmd(UpdateKind::OnlyIfNotSet),
        );
        if refreshed == 0 {
            return Err(CloserError::SnapshotOpenFailed(
                "no processes could be read from the system".to_string(),
            ));
        }

        let mut entries: Vec<ProcessEntry> = system
            .processes()
            .iter()
            // Linux threads are listed under their tid
            .filter(|(_, process)| process.thread_kind().is_none())
            // Exited but not yet reaped
            .filter(|(_, process)| !matches!(process.status(), ProcessStatus::Zombie))
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                parent_pid: process.parent().map(|p| p.as_u32()),
                exe_name: exe_name(process),
            })
            .collect();
        entries.sort_by_key(|e| e.pid);

        debug!(count = entries.len(), "Captured sysinfo process listing");
        Ok(entries)
    }
}
