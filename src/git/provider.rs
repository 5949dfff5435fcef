//! [`VcsProvider`] backed by git2.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use git2::{DiffOptions, ErrorCode, ObjectType, Oid, Patch, Repository, StatusOptions, Tree};
use tracing::{debug, warn};

use crate::error::VcsError;
use crate::vcs::{
    BranchSource, Change, CommitRecord, ContentRef, RepositoryRoot, Revision, VcsProvider,
};

use super::commits::{head_commit_changes, is_unborn, recent_commits};

/// Number of unchanged lines shown around each hunk.
const CONTEXT_LINES: u32 = 3;

/// Git repositories identified by their work-tree roots.
///
/// Each lookup opens its repository afresh, so the provider can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct GitProvider {
    roots: Vec<RepositoryRoot>,
}

impl GitProvider {
    pub fn new(roots: Vec<RepositoryRoot>) -> Self {
        Self { roots }
    }

    /// Discover the repositories containing each of `paths`.
    ///
    /// Paths inside the same repository collapse to a single root.
    pub fn discover<P: AsRef<Path>>(paths: &[P]) -> Result<Self, VcsError> {
        let mut roots = Vec::new();

        for path in paths {
            let path = path.as_ref();
            let repo = Repository::discover(path).map_err(|source| VcsError::OpenRepository {
                path: path.to_path_buf(),
                source,
            })?;
            let workdir = repo
                .workdir()
                .ok_or_else(|| VcsError::BareRepository(path.to_path_buf()))?;

            let root = RepositoryRoot::new(normalize(workdir));
            if !roots.contains(&root) {
                debug!("Found repository at {}", root);
                roots.push(root);
            }
        }

        Ok(Self { roots })
    }

    fn open(&self, root: &RepositoryRoot) -> Result<Repository, VcsError> {
        Repository::open(root.path()).map_err(|source| VcsError::OpenRepository {
            path: root.path().to_path_buf(),
            source,
        })
    }
}

/// Canonical form of a work-tree path, without the trailing separator git2 adds.
fn normalize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.components().collect())
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, VcsError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(VcsError::Status(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(VcsError::Status)?;
    Ok(Some(tree))
}

fn submodule_paths(repo: &Repository) -> HashSet<PathBuf> {
    repo.submodules()
        .map(|submodules| {
            submodules
                .iter()
                .map(|submodule| submodule.path().to_path_buf())
                .collect()
        })
        .unwrap_or_default()
}

/// Name of the branch HEAD will create on the first commit.
fn unborn_branch_name(repo: &Repository) -> Option<String> {
    let head = repo.find_reference("HEAD").ok()?;
    head.symbolic_target()?
        .strip_prefix("refs/heads/")
        .map(str::to_string)
}

/// Load the bytes one side of a change refers to; a missing side is empty.
fn load_content(repo: &Repository, revision: Option<&Revision>) -> Result<Vec<u8>, VcsError> {
    let Some(revision) = revision else {
        return Ok(Vec::new());
    };

    match &revision.content {
        ContentRef::Blob(id) => {
            let read_err = |source| VcsError::ReadBlob {
                id: id.clone(),
                source,
            };
            let oid = Oid::from_str(id).map_err(read_err)?;
            let blob = repo.find_blob(oid).map_err(read_err)?;
            Ok(blob.content().to_vec())
        }
        ContentRef::WorkingTree => read_working_file(&revision.path),
    }
}

/// Read a working-tree file the way git stores it: a symlink is its target.
fn read_working_file(path: &Path) -> Result<Vec<u8>, VcsError> {
    let read_err = |source| VcsError::ReadFile {
        path: path.to_path_buf(),
        source,
    };

    let metadata = std::fs::symlink_metadata(path).map_err(read_err)?;
    if metadata.file_type().is_symlink() {
        let target = std::fs::read_link(path).map_err(read_err)?;
        return Ok(target.into_os_string().into_encoded_bytes());
    }
    std::fs::read(path).map_err(read_err)
}

/// Unified diff of a single change.
fn change_patch(
    repo: &Repository,
    root: &RepositoryRoot,
    change: &Change,
    path: &Path,
    reverse: bool,
) -> Result<String, VcsError> {
    let mut old = load_content(repo, change.before.as_ref())?;
    let mut new = load_content(repo, change.after.as_ref())?;

    let relative = root.relativize(path);
    let mut old_path = change
        .before
        .as_ref()
        .map_or(relative, |r| root.relativize(&r.path));
    let mut new_path = relative;

    if reverse {
        std::mem::swap(&mut old, &mut new);
        std::mem::swap(&mut old_path, &mut new_path);
    }

    let mut opts = DiffOptions::new();
    opts.context_lines(CONTEXT_LINES);
    let mut patch = Patch::from_buffers(
        &old,
        Some(old_path),
        &new,
        Some(new_path),
        Some(&mut opts),
    )
    .map_err(VcsError::Diff)?;
    let buf = patch.to_buf().map_err(VcsError::Diff)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

impl VcsProvider for GitProvider {
    fn repositories(&self) -> Vec<RepositoryRoot> {
        self.roots.clone()
    }

    fn pending_changes(&self, root: &RepositoryRoot) -> Result<Vec<Change>, VcsError> {
        let repo = self.open(root)?;
        let head_tree = resolve_head_tree(&repo)?;
        let submodules = submodule_paths(&repo);

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false)
            .exclude_submodules(false);
        let statuses = repo.statuses(Some(&mut opts)).map_err(VcsError::Status)?;

        let mut changes = Vec::new();
        for entry in statuses.iter() {
            if entry.status().is_ignored() {
                continue;
            }
            let Some(relative) = entry.path() else {
                warn!("Skipping change with a non UTF-8 path in {}", root);
                continue;
            };
            let relative = Path::new(relative.trim_end_matches('/'));
            let absolute = root.join(relative);

            let head_entry = head_tree
                .as_ref()
                .and_then(|tree| tree.get_path(relative).ok());
            let submodule = submodules.contains(relative)
                || head_entry
                    .as_ref()
                    .is_some_and(|e| e.kind() == Some(ObjectType::Commit));

            // Untracked nested repositories show up as directories.
            let after = match std::fs::symlink_metadata(&absolute) {
                Ok(metadata) if metadata.is_dir() && !submodule => {
                    if head_entry.is_none() {
                        debug!("Skipping directory {} in {}", relative.display(), root);
                        continue;
                    }
                    None
                }
                Ok(_) => Some(Revision::working_tree(absolute.clone())),
                Err(_) => None,
            };
            let before = head_entry.map(|e| Revision::blob(absolute.clone(), e.id().to_string()));

            if before.is_none() && after.is_none() {
                continue;
            }

            changes.push(Change {
                before,
                after,
                submodule,
            });
        }

        Ok(changes)
    }

    fn current_branch_of(&self, root: &RepositoryRoot) -> Option<BranchSource> {
        let repo = match self.open(root) {
            Ok(repo) => repo,
            Err(e) => {
                warn!("Cannot read branch: {}", e);
                return None;
            }
        };

        match repo.head() {
            Ok(head) if head.is_branch() => head
                .shorthand()
                .map(|name| BranchSource::Current(name.to_string())),
            // Detached HEAD
            Ok(_) => None,
            Err(e) if is_unborn(&e) => unborn_branch_name(&repo).map(BranchSource::Current),
            Err(e) => {
                warn!("Cannot resolve HEAD of {}: {}", root, e);
                None
            }
        }
    }

    fn history_of(
        &self,
        root: &RepositoryRoot,
        max_count: usize,
    ) -> Result<Vec<CommitRecord>, VcsError> {
        let repo = self.open(root)?;
        recent_commits(&repo, max_count)
    }

    fn diff_of(
        &self,
        root: &RepositoryRoot,
        changes: &[Change],
        reverse: bool,
    ) -> Result<String, VcsError> {
        let repo = self.open(root)?;
        let mut text = String::new();

        for change in changes {
            let Some(path) = change.path() else { continue };
            match change_patch(&repo, root, change, path, reverse) {
                Ok(patch) => text.push_str(&patch),
                Err(e) => warn!("Leaving {} out of the diff: {}", path.display(), e),
            }
        }

        Ok(text)
    }

    fn last_commit_changes(&self, root: &RepositoryRoot) -> Result<Vec<Change>, VcsError> {
        let repo = self.open(root)?;
        head_commit_changes(&repo, root)
    }
}
