//! Diff collection across repository roots.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::vcs::{Change, RepositoryRoot, VcsProvider};

/// The diff of one repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSegment {
    pub root: RepositoryRoot,
    pub text: String,
}

impl DiffSegment {
    /// Header line naming the root, without the trailing newline.
    pub fn header(&self) -> String {
        format!("Repository: {}", self.root)
    }
}

/// Per-root diffs in the order their roots were first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffBundle {
    pub segments: Vec<DiffSegment>,
}

impl DiffBundle {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Render every segment behind its header, segments separated by a newline.
    pub fn to_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| format!("{}\n{}", segment.header(), segment.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Glob patterns for paths that never reach the prompt.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    patterns: Vec<String>,
    set: GlobSet,
}

impl ExclusionRules {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::with_capacity(patterns.len());

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidGlob {
                pattern: pattern.to_string(),
                source,
            })?;
            builder.add(glob);
            kept.push(pattern.to_string());
        }

        let set = builder.build().map_err(|source| ConfigError::InvalidGlob {
            pattern: kept.join(","),
            source,
        })?;

        Ok(Self {
            patterns: kept,
            set,
        })
    }

    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::none()
    }
}

/// Group the surviving changes by repository root, first-seen order.
fn group_by_root<P, F>(
    provider: &P,
    changes: &[Change],
    is_excluded: F,
) -> Vec<(RepositoryRoot, Vec<Change>)>
where
    P: VcsProvider + ?Sized,
    F: Fn(&Path) -> bool,
{
    let mut groups: Vec<(RepositoryRoot, Vec<Change>)> = Vec::new();

    for change in changes {
        let Some(path) = change.path() else {
            continue;
        };
        if is_excluded(path) {
            debug!("Excluding {} from diff", path.display());
            continue;
        }
        if change.submodule {
            debug!("Skipping submodule change {}", path.display());
            continue;
        }
        let Some(root) = provider.root_of(path) else {
            debug!("No repository owns {}, dropping it", path.display());
            continue;
        };

        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, group)) => group.push(change.clone()),
            None => groups.push((root, vec![change.clone()])),
        }
    }

    groups
}

/// Build the diff bundle for `changes`.
///
/// Excluded paths, submodule changes and changes outside every known
/// repository are dropped. A root whose diff cannot be computed is skipped
/// with a warning, so the result may be partial; an empty bundle means there
/// is nothing to commit.
pub fn compute_diff<P, F>(
    provider: &P,
    changes: &[Change],
    reverse: bool,
    is_excluded: F,
) -> DiffBundle
where
    P: VcsProvider + ?Sized,
    F: Fn(&Path) -> bool,
{
    let segments = group_by_root(provider, changes, is_excluded)
        .into_iter()
        .filter_map(|(root, group)| match provider.diff_of(&root, &group, reverse) {
            Ok(text) if text.trim().is_empty() => None,
            Ok(text) => Some(DiffSegment { root, text }),
            Err(e) => {
                warn!("Failed to diff {}: {}", root, e);
                None
            }
        })
        .collect();

    DiffBundle { segments }
}
