//! Error types for commitscribe modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from version-control lookups.
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("Failed to open repository at {path}: {source}")]
    OpenRepository {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("Repository at {0} has no working tree")]
    BareRepository(PathBuf),

    #[error("Failed to read working tree status: {0}")]
    Status(#[source] git2::Error),

    #[error("Failed to compute diff: {0}")]
    Diff(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    History(#[source] git2::Error),

    #[error("Failed to read blob {id}: {source}")]
    ReadBlob {
        id: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Commit {id} has invalid timestamp (seconds={seconds})")]
    InvalidTimestamp { id: String, seconds: i64 },
}

/// Errors from Claude CLI operations.
///
/// Every failure of the CLI execution engine lands in exactly one of these
/// variants; the `Display` text is meant to be shown to the user as-is.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    ExecutableNotFound,

    #[error("Claude Code CLI not found at '{}' or it is not executable", .0.display())]
    NotExecutable(PathBuf),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to wait for Claude process: {0}")]
    WaitFailed(#[source] std::io::Error),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Failed to read Claude CLI output: {0}")]
    OutputReadError(String),

    #[error("Claude CLI exited with code {code}: {detail}")]
    NonZeroExit { code: i32, detail: String },

    #[error("Failed to parse Claude response: {0}")]
    MalformedResponse(String),

    #[error("No result message in Claude response stream")]
    NoResultInArray,

    #[error("No result in Claude response")]
    MissingResult,

    #[error("{0}")]
    ReportedError(String),
}

/// Errors from network API backends.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("No API key stored for '{0}'")]
    MissingCredential(String),

    #[error("{provider} request failed: {message}")]
    RequestFailed { provider: String, message: String },
}

/// Errors from whichever backend produced the message.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error(transparent)]
    Claude(#[from] ClaudeError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Errors from commit message generation.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("No changes to commit (the diff is empty)")]
    EmptyDiff,

    #[error("Commit message generation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl From<ClaudeError> for GenerateError {
    fn from(err: ClaudeError) -> Self {
        GenerateError::Backend(BackendError::Claude(err))
    }
}

/// Errors from loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid exclusion pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to read prompt template {path}: {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
