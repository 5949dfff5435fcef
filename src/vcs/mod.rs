//! Version-control collaborator interface.
//!
//! The core never talks to a VCS directly. It sees changes grouped by
//! repository root, a current branch per root and the commit history of a
//! root through [`VcsProvider`]; [`crate::git::GitProvider`] is the git2
//! implementation.

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::VcsError;

/// The work-tree path of one version-controlled tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryRoot(PathBuf);

impl RepositoryRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.0.join(relative)
    }

    /// Whether `path` lies inside this root.
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.0)
    }

    /// `path` relative to this root, or `path` itself if it lies elsewhere.
    pub fn relativize<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.0).unwrap_or(path)
    }
}

impl fmt::Display for RepositoryRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Where the content of one side of a change lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    /// An object stored in the repository, by id.
    Blob(String),
    /// The file as it currently exists on disk.
    WorkingTree,
}

/// One side (before or after) of a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub path: PathBuf,
    pub content: ContentRef,
}

impl Revision {
    pub fn blob(path: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: ContentRef::Blob(id.into()),
        }
    }

    pub fn working_tree(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: ContentRef::WorkingTree,
        }
    }
}

/// A single file modification.
///
/// Additions have no `before`, deletions have no `after`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub before: Option<Revision>,
    pub after: Option<Revision>,
    /// The change moves a submodule pointer rather than file content.
    pub submodule: bool,
}

impl Change {
    pub fn new(before: Option<Revision>, after: Option<Revision>) -> Self {
        Self {
            before,
            after,
            submodule: false,
        }
    }

    /// The path of the file after the change, falling back to before.
    pub fn path(&self) -> Option<&Path> {
        self.after
            .as_ref()
            .or(self.before.as_ref())
            .map(|revision| revision.path.as_path())
    }
}

/// A commit as seen by history lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub id: String,
    pub message: String,
    pub time: DateTime<Utc>,
}

/// How a repository reports the branch it is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSource {
    /// Native branch tracking (git): the current branch name.
    Current(String),
    /// Tree-layout branching (svn): the URL of the working copy, from which
    /// a `branches/`, `tags/` or `trunk` label is extracted.
    LayoutUrl(String),
}

/// Access to the version-control state of one or more repositories.
///
/// Implementations perform blocking I/O; callers run them off the async
/// runtime (see [`crate::commit::ContextAggregator`]).
#[cfg_attr(test, mockall::automock)]
pub trait VcsProvider: Send + Sync {
    /// Every repository this provider knows about.
    fn repositories(&self) -> Vec<RepositoryRoot>;

    /// The repository owning `path`, preferring the innermost root.
    fn root_of(&self, path: &Path) -> Option<RepositoryRoot> {
        self.repositories()
            .into_iter()
            .filter(|root| root.contains(path))
            .max_by_key(|root| root.path().components().count())
    }

    /// Uncommitted changes (staged, unstaged and untracked) under `root`.
    fn pending_changes(&self, root: &RepositoryRoot) -> Result<Vec<Change>, VcsError>;

    /// Uncommitted changes of every repository, grouped by root.
    ///
    /// Repositories whose status cannot be read are skipped.
    fn changes_grouped_by_root(&self) -> Vec<(RepositoryRoot, Vec<Change>)> {
        self.repositories()
            .into_iter()
            .filter_map(|root| match self.pending_changes(&root) {
                Ok(changes) => Some((root, changes)),
                Err(e) => {
                    warn!("Skipping {}: {}", root, e);
                    None
                }
            })
            .collect()
    }

    fn current_branch_of(&self, root: &RepositoryRoot) -> Option<BranchSource>;

    /// Up to `max_count` commits reachable from the current head, newest first.
    fn history_of(
        &self,
        root: &RepositoryRoot,
        max_count: usize,
    ) -> Result<Vec<CommitRecord>, VcsError>;

    /// Unified diff text for `changes`, all of which belong to `root`.
    ///
    /// With `reverse`, before and after are swapped.
    fn diff_of(
        &self,
        root: &RepositoryRoot,
        changes: &[Change],
        reverse: bool,
    ) -> Result<String, VcsError>;

    /// The changes recorded by the most recent commit under `root`.
    fn last_commit_changes(&self, root: &RepositoryRoot) -> Result<Vec<Change>, VcsError>;
}
