//! Git operations using git2-rs.

pub mod commits;
pub mod provider;

pub use commits::{head_commit_changes, recent_commits};
pub use provider::GitProvider;
