#[cfg(windows)]
mod windows_impl {
    use proc_closer_core::{
        CloserError, CloserResult, ProcessId, ProcessOwnerLookup, TopLevelWindows, WindowHandle,
    };
    use std::ffi::c_void;
    use windows::Win32::Foundation::{GetLastError, HWND, LPARAM};
    use windows::Win32::UI::WindowsAndMessaging::{EnumWindows, GetWindowThreadProcessId};
    use windows::core::BOOL;

    type Visit<'a> = &'a mut dyn FnMut(WindowHandle) -> bool;

    pub(crate) fn to_hwnd(window: WindowHandle) -> HWND {
        HWND(window.0 as *mut c_void)
    }

    /// Win32 error code carried by an `HRESULT` built from one
    fn win32_code(e: &windows::core::Error) -> u32 {
        let hr = e.code().0 as u32;
        if hr & 0xFFFF_0000 == 0x8007_0000 {
            hr & 0xFFFF
        } else {
            hr
        }
    }

    unsafe extern "system" fn visit_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
        // SAFETY: lparam points at the `Visit` owned by `enumerate`, which
        // outlives the EnumWindows call. `visit` does not unwind.
        let visit = unsafe { &mut *(lparam.0 as *mut Visit<'_>) };
        BOOL::from(visit(WindowHandle(hwnd.0 as isize)))
    }

    /// Top-level windows as reported by `EnumWindows`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct EnumWindowsSource;

    impl TopLevelWindows for EnumWindowsSource {
        fn enumerate(&self, visit: &mut dyn FnMut(WindowHandle) -> bool) -> Result<(), u32> {
            let mut visit: Visit<'_> = visit;
            let lparam = LPARAM(&mut visit as *mut Visit<'_> as isize);
            // EnumWindows also fails when the callback returns FALSE
            unsafe { EnumWindows(Some(visit_window), lparam) }.map_err(|e| win32_code(&e))
        }
    }

    /// Owner lookup through `GetWindowThreadProcessId`
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WindowCreatorLookup;

    impl ProcessOwnerLookup for WindowCreatorLookup {
        fn owner_of(&self, window: WindowHandle) -> CloserResult<ProcessId> {
            let mut pid: u32 = 0;
            let thread = unsafe { GetWindowThreadProcessId(to_hwnd(window), Some(&mut pid)) };
            if thread == 0 {
                let code = unsafe { GetLastError() }.0;
                return Err(CloserError::OwnerLookupFailed { code });
            }
            Ok(pid)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use proc_closer_core::{WindowEnumerationStatus, WindowEnumerator};
        use std::convert::Infallible;

        #[test]
        fn test_enumeration_completes() {
            let mut enumerator = WindowEnumerator::new(EnumWindowsSource);
            let status = enumerator.run(|_| Ok::<_, Infallible>(true));
            assert_eq!(status, WindowEnumerationStatus::Completed);
        }

        #[test]
        fn test_stop_is_not_primitive_failure() {
            let mut enumerator = WindowEnumerator::new(EnumWindowsSource);
            let mut calls = 0;
            let status = enumerator.run(|_| {
                calls += 1;
                Ok::<_, Infallible>(false)
            });
            if calls > 0 {
                assert_eq!(status, WindowEnumerationStatus::StoppedEarly);
            } else {
                assert_eq!(status, WindowEnumerationStatus::Completed);
            }
        }

        #[test]
        fn test_owner_of_own_window_is_current_process() {
            use windows::Win32::UI::WindowsAndMessaging::{
                CreateWindowExW, DestroyWindow, HWND_MESSAGE, WINDOW_EX_STYLE, WINDOW_STYLE,
            };
            use windows::core::w;

            // Message-only window of a system class, created by this process
            let hwnd = unsafe {
                CreateWindowExW(
                    WINDOW_EX_STYLE(0),
                    w!("STATIC"),
                    w!(""),
                    WINDOW_STYLE(0),
                    0,
                    0,
                    0,
                    0,
                    Some(HWND_MESSAGE),
                    None,
                    None,
                    None,
                )
            }
            .unwrap();

            let owner = WindowCreatorLookup.owner_of(WindowHandle(hwnd.0 as isize));
            unsafe { DestroyWindow(hwnd) }.unwrap();

            assert_eq!(owner.unwrap(), std::process::id());
        }

        #[test]
        fn test_owner_of_invalid_window_fails_with_code() {
            let result = WindowCreatorLookup.owner_of(WindowHandle(0));
            match result {
                Err(CloserError::OwnerLookupFailed { code }) => assert_ne!(code, 0),
                other => panic!("expected OwnerLookupFailed, got {other:?}"),
            }
        }
    }
}

#[cfg(windows)]
pub(crate) use windows_impl::to_hwnd;
#[cfg(windows)]
pub use windows_impl::{EnumWindowsSource, WindowCreatorLookup};
