//! Commit history lookups.

use chrono::{DateTime, Utc};
use git2::{Commit, Delta, DiffFile, ErrorCode, FileMode, Repository, Sort};

use crate::error::VcsError;
use crate::vcs::{Change, CommitRecord, RepositoryRoot, Revision};

impl CommitRecord {
    /// Create a CommitRecord from a git2 Commit.
    pub fn from_git2_commit(commit: &Commit) -> Result<Self, VcsError> {
        let id = commit.id().to_string();
        let seconds = commit.time().seconds();
        let time = DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| {
            VcsError::InvalidTimestamp {
                id: id.clone(),
                seconds,
            }
        })?;

        Ok(Self {
            id,
            message: commit.message().unwrap_or("").to_string(),
            time,
        })
    }
}

/// Whether a git2 error means "HEAD points at nothing yet".
pub(crate) fn is_unborn(err: &git2::Error) -> bool {
    matches!(err.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound)
}

/// Fetch up to `max_count` commits reachable from HEAD, newest first.
///
/// A repository without commits has no history, which is not an error.
pub fn recent_commits(repo: &Repository, max_count: usize) -> Result<Vec<CommitRecord>, VcsError> {
    if max_count == 0 {
        return Ok(Vec::new());
    }

    let mut revwalk = repo.revwalk().map_err(VcsError::History)?;
    if let Err(e) = revwalk.push_head() {
        if is_unborn(&e) {
            return Ok(Vec::new());
        }
        return Err(VcsError::History(e));
    }
    revwalk.set_sorting(Sort::TIME).map_err(VcsError::History)?;

    let mut records = Vec::with_capacity(max_count);
    for oid in revwalk.take(max_count) {
        let oid = oid.map_err(VcsError::History)?;
        let commit = repo.find_commit(oid).map_err(VcsError::History)?;
        records.push(CommitRecord::from_git2_commit(&commit)?);
    }

    Ok(records)
}

/// The changes recorded by the HEAD commit, relative to its first parent.
///
/// Both sides reference blobs, so the diff can be rebuilt later without the
/// working tree. A root commit is diffed against the empty tree.
pub fn head_commit_changes(
    repo: &Repository,
    root: &RepositoryRoot,
) -> Result<Vec<Change>, VcsError> {
    let head = match repo.head() {
        Ok(head) => head,
        Err(e) if is_unborn(&e) => return Ok(Vec::new()),
        Err(e) => return Err(VcsError::History(e)),
    };

    let commit = head.peel_to_commit().map_err(VcsError::History)?;
    let tree = commit.tree().map_err(VcsError::Diff)?;
    let parent_tree = match commit.parent(0) {
        Ok(parent) => Some(parent.tree().map_err(VcsError::Diff)?),
        Err(_) => None,
    };

    let diff = repo
        .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
        .map_err(VcsError::Diff)?;

    Ok(diff
        .deltas()
        .filter_map(|delta| {
            change_from_delta(root, delta.status(), &delta.old_file(), &delta.new_file())
        })
        .collect())
}

fn change_from_delta(
    root: &RepositoryRoot,
    status: Delta,
    old: &DiffFile<'_>,
    new: &DiffFile<'_>,
) -> Option<Change> {
    let side = |file: &DiffFile<'_>| {
        file.path()
            .map(|path| Revision::blob(root.join(path), file.id().to_string()))
    };

    let before = match status {
        Delta::Added | Delta::Untracked => None,
        _ => side(old),
    };
    let after = match status {
        Delta::Deleted => None,
        _ => side(new),
    };

    if before.is_none() && after.is_none() {
        return None;
    }

    Some(Change {
        before,
        after,
        submodule: old.mode() == FileMode::Commit || new.mode() == FileMode::Commit,
    })
}
