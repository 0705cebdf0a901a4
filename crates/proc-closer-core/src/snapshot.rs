use std::slice;
use tracing::{debug, warn};

use crate::error::CloserResult;
use crate::process::{ProcessEntry, SnapshotSource};

/// A point-in-time listing of every process on the system.
///
/// The listing is copied out of the platform enumeration when the
/// snapshot is opened or refreshed. [`iter`](Self::iter) gives any number
/// of independent traversals; [`begin`](Self::begin) and
/// [`advance`](Self::advance) drive a single built-in cursor.
#[derive(Debug)]
pub struct ProcessSnapshot<S: SnapshotSource> {
    source: S,
    entries: Vec<ProcessEntry>,
    cursor: usize,
}

impl<S: SnapshotSource> ProcessSnapshot<S> {
    /// Capture a fresh listing from `source`
    pub fn open(source: S) -> CloserResult<Self> {
        let entries = source.capture()?;
        debug!(count = entries.len(), "Opened process snapshot");
        Ok(Self {
            source,
            entries,
            cursor: 0,
        })
    }

    /// Replace the listing with a new capture and reset the cursor.
    ///
    /// On failure the previous listing and cursor are kept.
    pub fn refresh(&mut self) -> CloserResult<()> {
        match self.source.capture() {
            Ok(entries) => {
                debug!(
                    previous = self.entries.len(),
                    count = entries.len(),
                    "Refreshed process snapshot"
                );
                self.entries = entries;
                self.cursor = 0;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Process snapshot refresh failed, keeping previous listing");
                Err(e)
            }
        }
    }

    /// Reset the cursor and return the first entry
    pub fn begin(&mut self) -> Option<&ProcessEntry> {
        self.cursor = 0;
        self.entries.first()
    }

    /// Move the cursor forward and return the entry under it
    pub fn advance(&mut self) -> Option<&ProcessEntry> {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        }
        self.entries.get(self.cursor)
    }

    pub fn iter(&self) -> slice::Iter<'_, ProcessEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[ProcessEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<'a, S: SnapshotSource> IntoIterator for &'a ProcessSnapshot<S> {
    type Item = &'a ProcessEntry;
    type IntoIter = slice::Iter<'a, ProcessEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
