//! Non-fatal advisories raised while building a prompt.

use std::fmt;
use std::sync::Mutex;

use tracing::warn;

/// Conditions worth telling the user about that never abort generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    /// The template asks for `{branch}` but no branch could be determined.
    NoCommonBranch,
    /// The template uses task tokens but no active task was supplied.
    NoTaskManager,
    /// Nothing survived diffing, so there is nothing to describe.
    EmptyDiff,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::NoCommonBranch => {
                "No common branch found for the selected changes; using \"main\" in the prompt"
            }
            Advisory::NoTaskManager => {
                "The prompt uses task placeholders but no active task is set; they are left as-is"
            }
            Advisory::EmptyDiff => "No changes to describe (the diff is empty)",
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Receives advisories; fire-and-forget.
pub trait AdvisorySink: Send + Sync {
    fn send(&self, advisory: Advisory);
}

/// Logs advisories as warnings.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl AdvisorySink for LogSink {
    fn send(&self, advisory: Advisory) {
        warn!("{}", advisory);
    }
}

/// Keeps every advisory it receives, in order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    received: Mutex<Vec<Advisory>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<Advisory> {
        self.received
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl AdvisorySink for CollectingSink {
    fn send(&self, advisory: Advisory) {
        if let Ok(mut guard) = self.received.lock() {
            guard.push(advisory);
        }
    }
}
