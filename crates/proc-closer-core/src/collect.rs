use std::collections::BTreeSet;
use tracing::trace;

use crate::process::{ProcessEntry, SnapshotSource};
use crate::snapshot::ProcessSnapshot;

/// Builds typed collections from a snapshot.
///
/// `admit` decides which entries are included, in the manner of a
/// `filter` predicate; `extract` turns an admitted entry into the target
/// element type.
#[derive(Debug, Clone)]
pub struct CollectionBuilder<A, X> {
    admit: A,
    extract: X,
}

impl<A, X> CollectionBuilder<A, X>
where
    A: Fn(&ProcessEntry) -> bool,
{
    pub fn new(admit: A, extract: X) -> Self {
        Self { admit, extract }
    }

    /// Extracted values in snapshot order, duplicates kept
    pub fn build_list<T, S>(&self, snapshot: &ProcessSnapshot<S>) -> Vec<T>
    where
        X: Fn(&ProcessEntry) -> T,
        S: SnapshotSource,
    {
        let list: Vec<T> = self.admitted(snapshot).map(&self.extract).collect();
        trace!(scanned = snapshot.len(), admitted = list.len(), "Built process list");
        list
    }

    /// Extracted values with duplicates collapsed
    pub fn build_set<T, S>(&self, snapshot: &ProcessSnapshot<S>) -> BTreeSet<T>
    where
        X: Fn(&ProcessEntry) -> T,
        T: Ord,
        S: SnapshotSource,
    {
        let set: BTreeSet<T> = self.admitted(snapshot).map(&self.extract).collect();
        trace!(scanned = snapshot.len(), admitted = set.len(), "Built process set");
        set
    }

    fn admitted<'a, S: SnapshotSource>(
        &'a self,
        snapshot: &'a ProcessSnapshot<S>,
    ) -> impl Iterator<Item = &'a ProcessEntry> + 'a {
        snapshot.iter().filter(move |entry| (self.admit)(*entry))
    }
}
