//! Context aggregation and prompt building for commit messages.

pub mod aggregate;
pub mod branch;
pub mod context;
pub mod diff;
pub mod history;
pub mod prompt;

pub use aggregate::ContextAggregator;
pub use branch::{common_branch, extract_layout_branch};
pub use context::{CommitContext, Locale, TaskInfo};
pub use diff::{DiffBundle, DiffSegment, ExclusionRules, compute_diff};
pub use history::{last_commit_changes, pending_changes, previous_commit_messages};
pub use prompt::{render, substitute_tokens};
