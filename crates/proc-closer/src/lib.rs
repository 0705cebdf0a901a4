//! Find and close running instances of named executables on the current OS.
//!
//! The backend is picked at compile time: `proc-closer-unix` on Unix,
//! `proc-closer-windows` on Windows. Everything in `proc-closer-core` is
//! re-exported, so most callers only need this crate.

#[cfg(unix)]
pub type PlatformSnapshotSource = proc_closer_unix::SysinfoSnapshotSource;
#[cfg(unix)]
pub type PlatformTerminator = proc_closer_unix::SignalTerminator;

#[cfg(windows)]
pub type PlatformSnapshotSource = proc_closer_windows::ToolhelpSnapshotSource;
#[cfg(windows)]
pub type PlatformTerminator = proc_closer_windows::WindowsTerminator;

/// [`ProcessCloser`] wired to the running OS
#[cfg(any(unix, windows))]
pub type PlatformProcessCloser = ProcessCloser<PlatformSnapshotSource, PlatformTerminator>;

/// Name of the backend selected for this build
pub fn platform_name() -> &'static str {
    #[cfg(unix)]
    return proc_closer_unix::UnixCloserFactory::platform_name();

    #[cfg(windows)]
    return proc_closer_windows::WindowsCloserFactory::platform_name();

    #[cfg(not(any(unix, windows)))]
    return "unsupported";
}

/// Closer for `names` with the default shutdown policy
#[cfg(any(unix, windows))]
pub fn process_closer<S: ToString, I: IntoIterator<Item = S>>(
    names: I,
) -> CloserResult<PlatformProcessCloser> {
    process_closer_with_config(CloserConfig::for_names(names))
}

/// Closer built from an explicit configuration
#[cfg(any(unix, windows))]
pub fn process_closer_with_config(config: CloserConfig) -> CloserResult<PlatformProcessCloser> {
    #[cfg(unix)]
    let (source, terminator) = (
        proc_closer_unix::UnixCloserFactory::snapshot_source(),
        proc_closer_unix::UnixCloserFactory::terminator(),
    );

    #[cfg(windows)]
    let (source, terminator) = (
        proc_closer_windows::WindowsCloserFactory::snapshot_source(),
        proc_closer_windows::WindowsCloserFactory::terminator(),
    );

    tracing::debug!(platform = platform_name(), names = ?config.names, "Creating process closer");
    ProcessCloser::new(config, source, terminator)
}

#[cfg(not(any(unix, windows)))]
pub fn process_closer<S: ToString, I: IntoIterator<Item = S>>(_names: I) -> CloserResult<()> {
    Err(CloserError::NotImplemented("process closing on this platform"))
}

#[cfg(not(any(unix, windows)))]
pub fn process_closer_with_config(_config: CloserConfig) -> CloserResult<()> {
    Err(CloserError::NotImplemented("process closing on this platform"))
}

/// Snapshot of every process currently running
#[cfg(any(unix, windows))]
pub fn take_snapshot() -> CloserResult<ProcessSnapshot<PlatformSnapshotSource>> {
    ProcessSnapshot::open(PlatformSnapshotSource::new())
}

/// Enumerator over the desktop's top-level windows
#[cfg(windows)]
pub fn window_enumerator() -> WindowEnumerator<proc_closer_windows::EnumWindowsSource> {
    WindowEnumerator::new(proc_closer_windows::WindowsCloserFactory::window_source())
}

/// Window to creating-process lookup
#[cfg(windows)]
pub fn owner_lookup() -> proc_closer_windows::WindowCreatorLookup {
    proc_closer_windows::WindowsCloserFactory::owner_lookup()
}

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// With `json` set, events are written as JSON lines. Does nothing if a
/// global subscriber is already installed.
pub fn init_tracing(json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

pub use proc_closer_core::*;
