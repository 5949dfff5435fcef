//! In-memory [`VcsProvider`] for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};

use super::{BranchSource, Change, CommitRecord, RepositoryRoot, Revision, VcsProvider};
use crate::error::VcsError;

#[derive(Default)]
pub(crate) struct FakeVcs {
    pub roots: Vec<RepositoryRoot>,
    pub pending: HashMap<RepositoryRoot, Vec<Change>>,
    pub branches: HashMap<RepositoryRoot, BranchSource>,
    pub histories: HashMap<RepositoryRoot, Vec<CommitRecord>>,
    pub last_commits: HashMap<RepositoryRoot, Vec<Change>>,
    /// Roots whose diff and history lookups fail.
    pub broken: HashSet<RepositoryRoot>,
    pub branch_lookups: AtomicUsize,
}

impl FakeVcs {
    pub fn with_roots(roots: &[&str]) -> Self {
        Self {
            roots: roots.iter().map(|r| RepositoryRoot::new(*r)).collect(),
            ..Default::default()
        }
    }

    pub fn root(path: &str) -> RepositoryRoot {
        RepositoryRoot::new(path)
    }
}

/// A working-tree modification of `path`.
pub(crate) fn modified(path: &str) -> Change {
    Change::new(
        Some(Revision::blob(path, "0000")),
        Some(Revision::working_tree(path)),
    )
}

pub(crate) fn commit(id: &str, message: &str, seconds: i64) -> CommitRecord {
    CommitRecord {
        id: id.to_string(),
        message: message.to_string(),
        time: Utc.timestamp_opt(seconds, 0).unwrap(),
    }
}

fn broken_error() -> git2::Error {
    git2::Error::from_str("repository is broken")
}

impl VcsProvider for FakeVcs {
    fn repositories(&self) -> Vec<RepositoryRoot> {
        self.roots.clone()
    }

    fn pending_changes(&self, root: &RepositoryRoot) -> Result<Vec<Change>, VcsError> {
        if self.broken.contains(root) {
            return Err(VcsError::Status(broken_error()));
        }
        Ok(self.pending.get(root).cloned().unwrap_or_default())
    }

    fn current_branch_of(&self, root: &RepositoryRoot) -> Option<BranchSource> {
        self.branch_lookups.fetch_add(1, Ordering::SeqCst);
        self.branches.get(root).cloned()
    }

    fn history_of(
        &self,
        root: &RepositoryRoot,
        max_count: usize,
    ) -> Result<Vec<CommitRecord>, VcsError> {
        if self.broken.contains(root) {
            return Err(VcsError::History(broken_error()));
        }
        Ok(self
            .histories
            .get(root)
            .map(|commits| commits.iter().take(max_count).cloned().collect())
            .unwrap_or_default())
    }

    fn diff_of(
        &self,
        root: &RepositoryRoot,
        changes: &[Change],
        reverse: bool,
    ) -> Result<String, VcsError> {
        if self.broken.contains(root) {
            return Err(VcsError::Diff(broken_error()));
        }
        let marker = if reverse { '-' } else { '+' };
        Ok(changes
            .iter()
            .filter_map(|change| change.path())
            .map(|path| format!("{marker}{}\n", root.relativize(path).display()))
            .collect())
    }

    fn last_commit_changes(&self, root: &RepositoryRoot) -> Result<Vec<Change>, VcsError> {
        Ok(self.last_commits.get(root).cloned().unwrap_or_default())
    }
}
