//! Windows-specific process discovery and termination

mod toolhelp_snapshot;
mod top_windows;
mod win_handle;
mod windows_terminator;

#[cfg(windows)]
pub use toolhelp_snapshot::ToolhelpSnapshotSource;
#[cfg(windows)]
pub use top_windows::{EnumWindowsSource, WindowCreatorLookup};
#[cfg(windows)]
pub use win_handle::{OwnedWin32Handle, Win32Handle};
#[cfg(windows)]
pub use windows_terminator::WindowsTerminator;

/// Windows backend factory
pub struct WindowsCloserFactory;

#[cfg(windows)]
impl WindowsCloserFactory {
    pub fn snapshot_source() -> ToolhelpSnapshotSource {
        ToolhelpSnapshotSource::new()
    }

    pub fn terminator() -> WindowsTerminator {
        WindowsTerminator::new()
    }

    pub fn window_source() -> EnumWindowsSource {
        EnumWindowsSource
    }

    pub fn owner_lookup() -> WindowCreatorLookup {
        WindowCreatorLookup
    }

    pub fn platform_name() -> &'static str {
        "Windows"
    }
}
