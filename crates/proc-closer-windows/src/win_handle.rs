#[cfg(windows)]
mod windows_impl {
    use proc_closer_core::{RawResource, ResourceHandle};
    use tracing::warn;
    use windows::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};

    /// Kernel object handles closed with `CloseHandle`.
    ///
    /// This is not a Windows Installer handle (`MSIHANDLE`); those use a
    /// different type and a different close function.
    pub struct Win32Handle;

    impl RawResource for Win32Handle {
        type Raw = HANDLE;
        const INVALID: HANDLE = INVALID_HANDLE_VALUE;

        fn release(raw: HANDLE) {
            // SAFETY: ResourceHandle only releases values it owns, once
            if let Err(e) = unsafe { CloseHandle(raw) } {
                warn!(error = %e, "CloseHandle failed");
            }
        }
    }

    /// Owned kernel object handle
    pub type OwnedWin32Handle = ResourceHandle<Win32Handle>;

    #[cfg(test)]
    mod tests {
        use super::*;
        use proc_closer_core::CloserError;
        use windows::Win32::System::Threading::{GetCurrentProcessId, OpenProcess, PROCESS_QUERY_LIMITED_INFORMATION};

        #[test]
        fn test_invalid_handle_value_rejected() {
            let result = OwnedWin32Handle::new(INVALID_HANDLE_VALUE);
            assert!(matches!(result, Err(CloserError::InvalidHandle)));
        }

        #[test]
        fn test_real_handle_accepted() {
            let raw = unsafe {
                OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, GetCurrentProcessId())
            }
            .unwrap();
            let handle = OwnedWin32Handle::new(raw).unwrap();
            assert_eq!(handle.as_raw(), Some(raw));
        }
    }
}

#[cfg(windows)]
pub use windows_impl::{OwnedWin32Handle, Win32Handle};
