//! Callback-driven enumeration of top-level windows.

use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Opaque reference to a platform window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct WindowHandle(pub isize);

/// How one enumeration run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowEnumerationStatus {
    /// Every window was visited and the callback never asked to stop
    Completed,
    /// The callback returned `false`
    StoppedEarly,
    /// The callback returned an error or panicked
    CallbackFailed,
    /// The callback never stopped, but the platform primitive reported failure
    PrimitiveFailed,
}

/// Detail kept alongside a failed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumerationFailure {
    Callback(String),
    Primitive { code: u32 },
}

/// The platform's "enumerate all top-level windows" facility.
pub trait TopLevelWindows {
    /// Call `visit` for each top-level window until it returns `false`.
    ///
    /// Returns `Err` with the platform error code when the primitive
    /// reports failure. Some primitives also report failure when `visit`
    /// asked to stop; [`WindowEnumerator`] tells the two apart.
    fn enumerate(&self, visit: &mut dyn FnMut(WindowHandle) -> bool) -> Result<(), u32>;
}

impl<W: TopLevelWindows + ?Sized> TopLevelWindows for &W {
    fn enumerate(&self, visit: &mut dyn FnMut(WindowHandle) -> bool) -> Result<(), u32> {
        (**self).enumerate(visit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Never,
    Started,
    Finished(WindowEnumerationStatus),
}

/// Drives a [`TopLevelWindows`] primitive with a per-window callback and
/// classifies how the traversal ended.
pub struct WindowEnumerator<W: TopLevelWindows> {
    windows: W,
    state: RunState,
    failure: Option<EnumerationFailure>,
}

impl<W: TopLevelWindows> WindowEnumerator<W> {
    pub fn new(windows: W) -> Self {
        Self {
            windows,
            state: RunState::Never,
            failure: None,
        }
    }

    /// Run one enumeration.
    ///
    /// `f` returns `Ok(true)` to continue and `Ok(false)` to stop. An
    /// `Err` or a panic inside `f` stops the traversal with
    /// [`WindowEnumerationStatus::CallbackFailed`]; the panic is caught
    /// here and never unwinds into the platform primitive.
    pub fn run<F, E>(&mut self, mut f: F) -> WindowEnumerationStatus
    where
        F: FnMut(WindowHandle) -> Result<bool, E>,
        E: fmt::Display,
    {
        self.state = RunState::Started;
        self.failure = None;

        let mut stop: Option<(WindowEnumerationStatus, Option<EnumerationFailure>)> = None;
        let mut visited = 0usize;
        let mut visit = |window: WindowHandle| -> bool {
            if stop.is_some() {
                return false;
            }
            visited += 1;
            match panic::catch_unwind(AssertUnwindSafe(|| f(window))) {
                Ok(Ok(true)) => true,
                Ok(Ok(false)) => {
                    stop = Some((WindowEnumerationStatus::StoppedEarly, None));
                    false
                }
                Ok(Err(e)) => {
                    stop = Some((
                        WindowEnumerationStatus::CallbackFailed,
                        Some(EnumerationFailure::Callback(e.to_string())),
                    ));
                    false
                }
                Err(payload) => {
                    stop = Some((
                        WindowEnumerationStatus::CallbackFailed,
                        Some(EnumerationFailure::Callback(panic_message(payload.as_ref()))),
                    ));
                    false
                }
            }
        };

        let primitive = self.windows.enumerate(&mut visit);

        let status = match (stop, primitive) {
            (Some((status, failure)), result) => {
                if result.is_ok() {
                    warn!(
                        status = ?status,
                        "Window enumeration primitive reported success after the callback stopped it"
                    );
                }
                self.failure = failure;
                status
            }
            (None, Ok(())) => WindowEnumerationStatus::Completed,
            (None, Err(code)) => {
                self.failure = Some(EnumerationFailure::Primitive { code });
                WindowEnumerationStatus::PrimitiveFailed
            }
        };

        debug!(status = ?status, visited, "Window enumeration finished");
        self.state = RunState::Finished(status);
        status
    }

    /// Terminal status of the most recent run, `None` before the first run
    pub fn status(&self) -> Option<WindowEnumerationStatus> {
        match self.state {
            RunState::Finished(status) => Some(status),
            RunState::Never | RunState::Started => None,
        }
    }

    pub fn failure(&self) -> Option<&EnumerationFailure> {
        self.failure.as_ref()
    }

    pub fn windows(&self) -> &W {
        &self.windows
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "callback panicked".to_string()
    }
}
