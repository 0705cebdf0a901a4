//! Exclusive ownership of a single OS resource reference.

use std::fmt;
use std::marker::PhantomData;

use tracing::{debug, trace};

use crate::error::{CloserError, CloserResult};

/// A kind of raw OS resource reference.
///
/// Ties a raw value type to the sentinel the platform uses for "no
/// resource" and to the call that releases it.
pub trait RawResource {
    type Raw: Copy + PartialEq + fmt::Debug;

    /// Value the platform returns instead of a usable reference
    const INVALID: Self::Raw;

    /// Release the reference. Called exactly once per accepted raw value.
    fn release(raw: Self::Raw);
}

/// Move-only owner of one raw resource reference.
///
/// The held value is never the kind's invalid sentinel. Dropping the
/// handle releases the reference.
pub struct ResourceHandle<R: RawResource> {
    raw: Option<R::Raw>,
    _kind: PhantomData<R>,
}

impl<R: RawResource> ResourceHandle<R> {
    /// Take ownership of `raw`, rejecting the invalid sentinel
    pub fn new(raw: R::Raw) -> CloserResult<Self> {
        Ok(Self {
            raw: Some(Self::validate(raw)?),
            _kind: PhantomData,
        })
    }

    /// Release the current reference, then take ownership of `raw`.
    ///
    /// If `raw` is the invalid sentinel the handle is left empty.
    pub fn reset(&mut self, raw: R::Raw) -> CloserResult<()> {
        self.release_held();
        self.raw = Some(Self::validate(raw)?);
        Ok(())
    }

    /// The owned raw value, or `None` after a failed [`reset`](Self::reset)
    pub fn as_raw(&self) -> Option<R::Raw> {
        self.raw
    }

    pub fn is_open(&self) -> bool {
        self.raw.is_some()
    }

    /// Give up ownership without releasing
    pub fn into_raw(mut self) -> Option<R::Raw> {
        self.raw.take()
    }

    fn validate(raw: R::Raw) -> CloserResult<R::Raw> {
        if raw == R::INVALID {
            debug!(raw = ?raw, "Rejected invalid raw handle");
            return Err(CloserError::InvalidHandle);
        }
        Ok(raw)
    }

    fn release_held(&mut self) {
        if let Some(raw) = self.raw.take() {
            trace!(raw = ?raw, "Releasing raw handle");
            R::release(raw);
        }
    }
}

impl<R: RawResource> Drop for ResourceHandle<R> {
    fn drop(&mut self) {
        self.release_held();
    }
}

impl<R: RawResource> fmt::Debug for ResourceHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static RELEASED: RefCell<Vec<i64>> = const { RefCell::new(Vec::new()) };
    }

    struct FakeResource;

    impl RawResource for FakeResource {
        type Raw = i64;
        const INVALID: i64 = -1;

        fn release(raw: i64) {
            RELEASED.with(|r| r.borrow_mut().push(raw));
        }
    }

    fn released() -> Vec<i64> {
        RELEASED.with(|r| r.borrow().clone())
    }

    #[test]
    fn test_invalid_sentinel_rejected() {
        let result = ResourceHandle::<FakeResource>::new(-1);
        assert!(matches!(result, Err(CloserError::InvalidHandle)));
        assert!(released().is_empty());
    }

    #[test]
    fn test_released_exactly_once_on_drop() {
        for raw in [0, 3, 99] {
            let handle = ResourceHandle::<FakeResource>::new(raw).unwrap();
            assert_eq!(handle.as_raw(), Some(raw));
            drop(handle);
        }
        assert_eq!(released(), vec![0, 3, 99]);
    }

    #[test]
    fn test_released_on_error_path() {
        fn fails_midway() -> CloserResult<()> {
            let _handle = ResourceHandle::<FakeResource>::new(5)?;
            ResourceHandle::<FakeResource>::new(-1)?;
            Ok(())
        }

        assert!(fails_midway().is_err());
        assert_eq!(released(), vec![5]);
    }

    #[test]
    fn test_reset_releases_old_first() {
        let mut handle = ResourceHandle::<FakeResource>::new(1).unwrap();
        handle.reset(2).unwrap();
        assert_eq!(released(), vec![1]);
        assert_eq!(handle.as_raw(), Some(2));

        drop(handle);
        assert_eq!(released(), vec![1, 2]);
    }

    #[test]
    fn test_reset_to_invalid_leaves_handle_empty() {
        let mut handle = ResourceHandle::<FakeResource>::new(8).unwrap();
        assert!(matches!(handle.reset(-1), Err(CloserError::InvalidHandle)));
        assert!(!handle.is_open());
        assert_eq!(released(), vec![8]);

        drop(handle);
        assert_eq!(released(), vec![8]);
    }

    #[test]
    fn test_move_transfers_ownership() {
        let handle = ResourceHandle::<FakeResource>::new(4).unwrap();
        let moved = handle;
        assert!(released().is_empty());
        drop(moved);
        assert_eq!(released(), vec![4]);
    }

    #[test]
    fn test_into_raw_skips_release() {
        let handle = ResourceHandle::<FakeResource>::new(6).unwrap();
        assert_eq!(handle.into_raw(), Some(6));
        assert!(released().is_empty());
    }
}
