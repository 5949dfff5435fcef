//! Settings snapshots read from the environment.
//!
//! Every value has a default. An unparsable value logs a warning and falls
//! back to the default instead of failing. CLI flags override what is read
//! here.

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::commit::{ExclusionRules, Locale};
use crate::error::ConfigError;

pub const CLAUDE_PATH_ENV_VAR: &str = "COMMITSCRIBE_CLAUDE_PATH";
pub const CLAUDE_MODEL_ENV_VAR: &str = "COMMITSCRIBE_CLAUDE_MODEL";
pub const CLAUDE_TIMEOUT_ENV_VAR: &str = "COMMITSCRIBE_CLAUDE_TIMEOUT";
pub const PREVIOUS_COMMITS_ENV_VAR: &str = "COMMITSCRIBE_PREVIOUS_COMMITS";
pub const LOCALE_ENV_VAR: &str = "COMMITSCRIBE_LOCALE";
pub const EXCLUDE_ENV_VAR: &str = "COMMITSCRIBE_EXCLUDE";

/// Default timeout for one CLI invocation (5 minutes).
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

pub const DEFAULT_PREVIOUS_COMMITS: usize = 3;

pub const DEFAULT_LOCALE: &str = "en";

pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
Write a commit message for the changes below.

Rules:
- Write the message in {locale}.
- Start with a summary line of at most 72 characters in the imperative mood.
- If the change needs more explanation, add a blank line and a short body.
- Output only the commit message, without quotes or code fences.
{- Take this hint from the author into account: $hint
}
The changes are on branch {branch}. Recent commit messages, for style:
{previousCommitMessages}

{diff}";

/// A trimmed, non-empty environment variable.
fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse an environment variable, warning and falling back on bad input.
fn env_parse<T>(name: &str, default: T, valid: impl Fn(&T) -> bool) -> T
where
    T: FromStr + std::fmt::Display,
{
    let Some(raw) = env_string(name) else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) if valid(&value) => value,
        _ => {
            warn!("Invalid {} value '{}', using default {}", name, raw, default);
            default
        }
    }
}

/// How to reach the Claude Code CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeCliConfig {
    /// Blank means "find `claude` on PATH".
    pub executable_path: String,
    /// Blank means the CLI's own default model.
    pub model_id: String,
    pub timeout_secs: u64,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            executable_path: String::new(),
            model_id: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClaudeCliConfig {
    pub fn from_env() -> Self {
        Self {
            executable_path: env_string(CLAUDE_PATH_ENV_VAR).unwrap_or_default(),
            model_id: env_string(CLAUDE_MODEL_ENV_VAR).unwrap_or_default(),
            timeout_secs: env_parse(CLAUDE_TIMEOUT_ENV_VAR, DEFAULT_TIMEOUT_SECS, |secs| {
                *secs > 0
            }),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// What goes into the prompt.
#[derive(Debug, Clone)]
pub struct PromptSettings {
    pub template: String,
    pub previous_commit_count: usize,
    pub locale: Locale,
    pub exclusions: ExclusionRules,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            previous_commit_count: DEFAULT_PREVIOUS_COMMITS,
            locale: Locale::parse(DEFAULT_LOCALE),
            exclusions: ExclusionRules::none(),
        }
    }
}

impl PromptSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        let patterns: Vec<String> = env_string(EXCLUDE_ENV_VAR)
            .map(|raw| raw.split(',').map(str::to_string).collect())
            .unwrap_or_default();

        Ok(Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            previous_commit_count: env_parse(
                PREVIOUS_COMMITS_ENV_VAR,
                DEFAULT_PREVIOUS_COMMITS,
                |_| true,
            ),
            locale: Locale::parse(
                &env_string(LOCALE_ENV_VAR).unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            ),
            exclusions: ExclusionRules::new(&patterns)?,
        })
    }
}

/// Read a prompt template from disk.
pub fn load_template(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::ReadTemplate {
        path: path.to_path_buf(),
        source,
    })
}
