//! Change-set and commit-history lookups across repositories.

use tracing::warn;

use crate::vcs::{Change, CommitRecord, RepositoryRoot, VcsProvider};

/// The messages of the `n` most recent commits in the repositories touched
/// by `changes`, newest first.
///
/// Up to `n` commits are read per repository; the merged list is then cut
/// back to `n`. Repositories whose history cannot be read are skipped.
pub fn previous_commit_messages<P>(provider: &P, n: usize, changes: &[Change]) -> Vec<String>
where
    P: VcsProvider + ?Sized,
{
    if n == 0 {
        return Vec::new();
    }

    let mut roots: Vec<RepositoryRoot> = Vec::new();
    for root in changes
        .iter()
        .filter_map(|change| change.path())
        .filter_map(|path| provider.root_of(path))
    {
        if !roots.contains(&root) {
            roots.push(root);
        }
    }

    let mut commits: Vec<CommitRecord> = Vec::new();
    for root in &roots {
        match provider.history_of(root, n) {
            Ok(history) => commits.extend(history),
            Err(e) => warn!("Skipping history of {}: {}", root, e),
        }
    }

    commits.sort_by(|a, b| b.time.cmp(&a.time));
    commits.truncate(n);

    commits
        .into_iter()
        .map(|commit| commit.message.trim_end().to_string())
        .collect()
}

/// The changes recorded by the latest commit of every repository.
///
/// Used when amending, so the replaced commit's content is described too.
pub fn last_commit_changes<P>(provider: &P) -> Vec<Change>
where
    P: VcsProvider + ?Sized,
{
    provider
        .repositories()
        .iter()
        .flat_map(|root| match provider.last_commit_changes(root) {
            Ok(changes) => changes,
            Err(e) => {
                warn!("Skipping last commit of {}: {}", root, e);
                Vec::new()
            }
        })
        .collect()
}

/// Every uncommitted change across all repositories.
pub fn pending_changes<P>(provider: &P) -> Vec<Change>
where
    P: VcsProvider + ?Sized,
{
    provider
        .changes_grouped_by_root()
        .into_iter()
        .flat_map(|(_, changes)| changes)
        .collect()
}
