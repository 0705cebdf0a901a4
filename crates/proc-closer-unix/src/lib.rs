//! Unix-specific process discovery and termination

mod unix_snapshot;
mod unix_terminator;

pub use unix_snapshot::SysinfoSnapshotSource;
#[cfg(unix)]
pub use unix_terminator::SignalTerminator;

/// Unix backend factory
pub struct UnixCloserFactory;

impl UnixCloserFactory {
    pub fn snapshot_source() -> SysinfoSnapshotSource {
        SysinfoSnapshotSource::new()
    }

    #[cfg(unix)]
    pub fn terminator() -> SignalTerminator {
        SignalTerminator::new()
    }

    pub fn platform_name() -> &'static str {
        "Unix"
    }
}
