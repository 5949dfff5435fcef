//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature, Time};
use tempfile::TempDir;

/// Get the path to test fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Get the path to a response fixture.
pub fn response_fixture(name: &str) -> PathBuf {
    fixtures_dir().join("responses").join(name)
}

/// Read a fixture file as a string.
pub fn read_fixture(path: PathBuf) -> String {
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {:?}: {}", path, e))
}

/// Write an executable shell script standing in for the claude CLI.
///
/// The directory must be kept alive for as long as the script is used.
#[cfg(unix)]
pub fn create_mock_script(script_content: &str) -> (TempDir, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let script_path = temp_dir.path().join("mock_claude.sh");

    let mut file = File::create(&script_path).expect("Failed to create mock script");
    file.write_all(script_content.as_bytes())
        .expect("Failed to write mock script");
    drop(file);

    // Make executable
    let mut perms = fs::metadata(&script_path)
        .expect("Failed to get metadata")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&script_path, perms).expect("Failed to set permissions");

    (temp_dir, script_path)
}

/// A mock CLI that prints a successful JSON result.
#[cfg(unix)]
pub fn create_replying_script(result: &str) -> (TempDir, PathBuf) {
    let body = serde_json::json!({ "type": "result", "is_error": false, "result": result });
    create_mock_script(&format!("#!/bin/sh\ncat <<'JSON'\n{}\nJSON\n", body))
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `name`, creating parent directories.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Write a file and commit it at a fixed time. Returns the commit OID.
    pub fn commit_at(&self, name: &str, content: &str, message: &str, seconds: i64) -> Oid {
        self.write(name, content);

        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(name)).expect("Failed to add file");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let sig = Signature::new("Test User", "test@example.com", &Time::new(seconds, 0))
            .expect("Failed to create signature");

        // Get parent commit if exists
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Create a branch at `oid` and check it out.
    pub fn checkout_branch(&self, name: &str, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("Failed to find commit");
        self.repo
            .branch(name, &commit, false)
            .expect("Failed to create branch");
        self.repo
            .set_head(&format!("refs/heads/{}", name))
            .expect("Failed to set HEAD");
    }
}
