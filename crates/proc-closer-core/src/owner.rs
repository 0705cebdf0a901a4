use crate::error::CloserResult;
use crate::process::ProcessId;
use crate::window::WindowHandle;

/// Resolves the process that created a window.
///
/// Implementations report a failed platform call as
/// [`CloserError::OwnerLookupFailed`](crate::CloserError::OwnerLookupFailed)
/// carrying the platform error code, never as a default process id.
pub trait ProcessOwnerLookup {
    fn owner_of(&self, window: WindowHandle) -> CloserResult<ProcessId>;
}

impl<L: ProcessOwnerLookup + ?Sized> ProcessOwnerLookup for &L {
    fn owner_of(&self, window: WindowHandle) -> CloserResult<ProcessId> {
        (**self).owner_of(window)
    }
}
