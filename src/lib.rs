//! commitscribe - A CLI tool that writes commit messages for pending changes.
//!
//! # Overview
//!
//! commitscribe collects the uncommitted changes of one or more repositories,
//! renders them together with the branch, recent commit messages and an
//! optional hint into a prompt, and asks Claude Code CLI (or another
//! configured backend) for a commit message.

pub mod claude;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod notify;
pub mod service;
pub mod vcs;

// Re-export commonly used types
pub use commit::{CommitContext, ContextAggregator, DiffBundle, ExclusionRules, Locale, TaskInfo};
pub use config::{ClaudeCliConfig, PromptSettings};
pub use error::{ApiError, BackendError, ClaudeError, ConfigError, GenerateError, VcsError};
pub use llm::Backend;
pub use notify::{Advisory, AdvisorySink};
pub use service::{CommitMessageService, GenerateRequest, PreparedPrompt};
pub use vcs::{Change, RepositoryRoot, VcsProvider};
