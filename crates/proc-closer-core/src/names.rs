//! Executable-name criteria, admit predicates and extractors.

use std::collections::{BTreeSet, HashSet};

use crate::collect::CollectionBuilder;
use crate::error::CloserResult;
use crate::owner::ProcessOwnerLookup;
use crate::process::{ProcessEntry, ProcessId, SnapshotSource};
use crate::snapshot::ProcessSnapshot;
use crate::window::WindowHandle;

fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Immutable set of executable names compared case-insensitively
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSet {
    folded: HashSet<String>,
    /// Names as given, deduplicated by their folded form
    names: Vec<String>,
}

impl NameSet {
    pub fn new<S: AsRef<str>, I: IntoIterator<Item = S>>(names: I) -> Self {
        let mut set = Self::default();
        for name in names {
            let name = name.as_ref();
            if set.folded.insert(fold(name)) {
                set.names.push(name.to_string());
            }
        }
        set
    }

    pub fn contains(&self, name: &str) -> bool {
        self.folded.contains(&fold(name))
    }

    /// Admit predicate: the entry's executable name is any member of the set
    pub fn matches_any(&self, entry: &ProcessEntry) -> bool {
        self.contains(&entry.exe_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Admit predicate that lets every process through
pub fn every_process(_: &ProcessEntry) -> bool {
    true
}

/// Extractor that copies only the process id
pub fn copy_pid(entry: &ProcessEntry) -> ProcessId {
    entry.pid
}

/// Extractor that copies the whole record
pub fn copy_all(entry: &ProcessEntry) -> ProcessEntry {
    entry.clone()
}

/// Admit predicate for a single executable name, case-insensitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessByName {
    folded: String,
}

impl ProcessByName {
    pub fn new(name: &str) -> Self {
        Self {
            folded: fold(name),
        }
    }

    pub fn matches(&self, entry: &ProcessEntry) -> bool {
        fold(&entry.exe_name) == self.folded
    }
}

/// Window predicate: the window was created by a process with a given
/// executable name.
///
/// The matching process ids are taken from the snapshot at construction;
/// each test asks `lookup` for the window's creator.
pub struct WindowOwnerNamed<L: ProcessOwnerLookup> {
    pids: BTreeSet<ProcessId>,
    lookup: L,
}

impl<L: ProcessOwnerLookup> WindowOwnerNamed<L> {
    pub fn new<S: SnapshotSource>(snapshot: &ProcessSnapshot<S>, name: &str, lookup: L) -> Self {
        let by_name = ProcessByName::new(name);
        let pids = CollectionBuilder::new(|e: &ProcessEntry| by_name.matches(e), copy_pid)
            .build_set(snapshot);
        Self { pids, lookup }
    }

    pub fn matches(&self, window: WindowHandle) -> CloserResult<bool> {
        let owner = self.lookup.owner_of(window)?;
        Ok(self.pids.contains(&owner))
    }

    pub fn pids(&self) -> &BTreeSet<ProcessId> {
        &self.pids
    }
}
