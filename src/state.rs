//! Process-wide installation state snapshot.
//!
//! The installed / outdated / pinned name sets are point-in-time snapshots of
//! the index, held for one command invocation. Nothing refreshes them
//! implicitly: callers reload at phase boundaries (after an install batch,
//! before re-scanning dependents) and a stale snapshot is a correctness bug,
//! not a race.

use std::collections::HashSet;

use crate::index::PackageIndex;

#[derive(Debug, Default, Clone)]
pub struct InstallState {
    installed: HashSet<String>,
    outdated: HashSet<String>,
    pinned: HashSet<String>,
}

impl InstallState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the index's current installed set.
    pub fn from_index(index: &dyn PackageIndex) -> Self {
        let mut state = Self::new();
        state.reload(index);
        state
    }

    /// Drop the previous snapshot and re-read the index.
    pub fn reload(&mut self, index: &dyn PackageIndex) {
        self.reset();
        for pkg in index.installed() {
            if pkg.outdated {
                self.outdated.insert(pkg.name.clone());
            }
            if pkg.pinned {
                self.pinned.insert(pkg.name.clone());
            }
            self.installed.insert(pkg.name);
        }
    }

    /// Clear all three sets.
    pub fn reset(&mut self) {
        self.installed.clear();
        self.outdated.clear();
        self.pinned.clear();
    }

    /// Record a successful install/upgrade: the package is now installed and
    /// no longer outdated.
    pub fn mark_installed(&mut self, name: &str) {
        self.installed.insert(name.to_string());
        self.outdated.remove(name);
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.contains(name)
    }

    pub fn is_outdated(&self, name: &str) -> bool {
        self.outdated.contains(name)
    }

    pub fn is_pinned(&self, name: &str) -> bool {
        self.pinned.contains(name)
    }

    /// Outdated names, sorted for stable output.
    pub fn outdated_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.outdated.iter().cloned().collect();
        names.sort();
        names
    }
}
