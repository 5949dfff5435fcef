//! Async facade over the blocking context lookups.

use std::sync::Arc;

use tokio::task;

use super::branch::common_branch;
use super::diff::{DiffBundle, ExclusionRules, compute_diff};
use super::history::{last_commit_changes, pending_changes, previous_commit_messages};
use crate::error::GenerateError;
use crate::vcs::{Change, VcsProvider};

/// Runs every VCS lookup on tokio's blocking pool.
#[derive(Clone)]
pub struct ContextAggregator {
    provider: Arc<dyn VcsProvider>,
}

impl ContextAggregator {
    pub fn new(provider: Arc<dyn VcsProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn VcsProvider> {
        &self.provider
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, GenerateError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn VcsProvider) -> T + Send + 'static,
    {
        let provider = Arc::clone(&self.provider);
        task::spawn_blocking(move || f(provider.as_ref()))
            .await
            .map_err(|e| GenerateError::TaskFailed(e.to_string()))
    }

    pub async fn compute_diff(
        &self,
        changes: Vec<Change>,
        reverse: bool,
        exclusions: ExclusionRules,
    ) -> Result<DiffBundle, GenerateError> {
        self.blocking(move |provider| {
            compute_diff(provider, &changes, reverse, |path| exclusions.is_excluded(path))
        })
        .await
    }

    pub async fn common_branch(
        &self,
        changes: Vec<Change>,
    ) -> Result<Option<String>, GenerateError> {
        self.blocking(move |provider| common_branch(provider, &changes))
            .await
    }

    pub async fn previous_commit_messages(
        &self,
        n: usize,
        changes: Vec<Change>,
    ) -> Result<Vec<String>, GenerateError> {
        self.blocking(move |provider| previous_commit_messages(provider, n, &changes))
            .await
    }

    pub async fn last_commit_changes(&self) -> Result<Vec<Change>, GenerateError> {
        self.blocking(|provider| last_commit_changes(provider))
            .await
    }

    pub async fn pending_changes(&self) -> Result<Vec<Change>, GenerateError> {
        self.blocking(|provider| pending_changes(provider)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vcs::BranchSource;
    use crate::vcs::fake::{FakeVcs, commit, modified};

    fn aggregator() -> ContextAggregator {
        let mut provider = FakeVcs::with_roots(&["/repo"]);
        provider
            .pending
            .insert(FakeVcs::root("/repo"), vec![modified("/repo/a.rs")]);
        provider
            .branches
            .insert(FakeVcs::root("/repo"), BranchSource::Current("dev".into()));
        provider
            .histories
            .insert(FakeVcs::root("/repo"), vec![commit("1", "Initial commit\n", 1)]);
        ContextAggregator::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_lookups_run_off_the_runtime() {
        let aggregator = aggregator();

        let changes = aggregator.pending_changes().await.unwrap();
        assert_eq!(changes.len(), 1);

        let bundle = aggregator
            .compute_diff(changes.clone(), false, ExclusionRules::none())
            .await
            .unwrap();
        assert_eq!(bundle.to_text(), "Repository: /repo\n+a.rs\n");

        let branch = aggregator.common_branch(changes.clone()).await.unwrap();
        assert_eq!(branch.as_deref(), Some("dev"));

        let messages = aggregator
            .previous_commit_messages(3, changes)
            .await
            .unwrap();
        assert_eq!(messages, vec!["Initial commit"]);
    }

    #[tokio::test]
    async fn test_exclusions_apply_through_facade() {
        let aggregator = aggregator();
        let rules = ExclusionRules::new(&["*.rs"]).unwrap();

        let bundle = aggregator
            .compute_diff(vec![modified("/repo/a.rs")], false, rules)
            .await
            .unwrap();

        assert!(bundle.is_empty());
    }
}
