//! Branch detection for a set of changes.

use std::collections::HashMap;

use tracing::debug;

use crate::vcs::{BranchSource, Change, RepositoryRoot, VcsProvider};

impl BranchSource {
    /// The label this source contributes to a branch vote.
    pub fn label(&self) -> Option<String> {
        match self {
            BranchSource::Current(name) => Some(name.clone()),
            BranchSource::LayoutUrl(url) => extract_layout_branch(url),
        }
    }
}

/// Derive a branch label from a tree-layout URL.
///
/// `.../branches/X/...` gives `X`, `.../tags/X/...` gives `tag: X` and a URL
/// containing `/trunk` gives `trunk`. Matching ignores case but the label
/// keeps the spelling of the URL.
pub fn extract_layout_branch(url: &str) -> Option<String> {
    let lower = url.to_ascii_lowercase();

    let segment_after = |marker: &str| -> Option<String> {
        let start = lower.find(marker)? + marker.len();
        let name = url[start..].split('/').next().unwrap_or("");
        (!name.is_empty()).then(|| name.to_string())
    };

    if let Some(name) = segment_after("/branches/") {
        return Some(name);
    }
    if let Some(name) = segment_after("/tags/") {
        return Some(format!("tag: {name}"));
    }
    if lower.contains("/trunk") {
        return Some("trunk".to_string());
    }
    None
}

/// The branch most of `changes` sit on.
///
/// Each change votes with the branch label of its repository. Ties go to the
/// label that was seen first. Returns `None` when no change yields a label.
pub fn common_branch<P>(provider: &P, changes: &[Change]) -> Option<String>
where
    P: VcsProvider + ?Sized,
{
    let mut labels: HashMap<RepositoryRoot, Option<String>> = HashMap::new();
    // (label, votes) in first-seen order
    let mut tally: Vec<(String, usize)> = Vec::new();

    for change in changes {
        let Some(root) = change.path().and_then(|path| provider.root_of(path)) else {
            continue;
        };

        let label = labels
            .entry(root)
            .or_insert_with_key(|root| {
                let label = provider
                    .current_branch_of(root)
                    .and_then(|source| source.label());
                debug!("Branch of {}: {:?}", root, label);
                label
            })
            .clone();

        let Some(label) = label else {
            continue;
        };
        match tally.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, votes)) => *votes += 1,
            None => tally.push((label, 1)),
        }
    }

    // Strictly greater keeps the earliest label on ties.
    let mut best: Option<(String, usize)> = None;
    for (label, votes) in tally {
        if best.as_ref().is_none_or(|(_, top)| votes > *top) {
            best = Some((label, votes));
        }
    }
    best.map(|(label, _)| label)
}
