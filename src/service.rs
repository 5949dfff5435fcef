//! Commit message generation, one job at a time.
//!
//! ```text
//!   changes ──▶ diff ──▶ branch + history ──▶ prompt ──▶ backend ──▶ message
//! ```
//!
//! Each call to [`CommitMessageService::generate`] is a job with its own
//! cancellation token. Starting a job cancels the one before it, and a
//! cancelled job drops its in-flight work, which kills any CLI process it
//! started.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::commit::{CommitContext, ContextAggregator, TaskInfo, render};
use crate::config::PromptSettings;
use crate::error::GenerateError;
use crate::llm::Backend;
use crate::notify::{Advisory, AdvisorySink, LogSink};
use crate::vcs::Change;

/// What to describe.
#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    /// The changes to include; `None` means every pending change.
    pub changes: Option<Vec<Change>>,
    /// Also include the changes of the last commit, which is being replaced.
    pub amend: bool,
    pub hint: Option<String>,
    pub task: Option<TaskInfo>,
}

/// A rendered prompt and the diff it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPrompt {
    pub diff: String,
    pub prompt: String,
}

pub struct CommitMessageService {
    aggregator: ContextAggregator,
    backend: Backend,
    settings: PromptSettings,
    sink: Arc<dyn AdvisorySink>,
    current: Mutex<Option<(u64, CancellationToken)>>,
    next_job: AtomicU64,
}

impl CommitMessageService {
    pub fn new(aggregator: ContextAggregator, backend: Backend, settings: PromptSettings) -> Self {
        Self {
            aggregator,
            backend,
            settings,
            sink: Arc::new(LogSink),
            current: Mutex::new(None),
            next_job: AtomicU64::new(1),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn AdvisorySink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Collect the context for `request` and render the prompt.
    ///
    /// Fails with [`GenerateError::EmptyDiff`] when nothing is left to
    /// describe after exclusions.
    pub async fn prepare(
        &self,
        request: &GenerateRequest,
    ) -> Result<PreparedPrompt, GenerateError> {
        let mut changes = match &request.changes {
            Some(changes) => changes.clone(),
            None => self.aggregator.pending_changes().await?,
        };
        if request.amend {
            changes.extend(self.aggregator.last_commit_changes().await?);
        }

        let bundle = self
            .aggregator
            .compute_diff(changes.clone(), false, self.settings.exclusions.clone())
            .await?;
        if bundle.is_empty() {
            self.sink.send(Advisory::EmptyDiff);
            return Err(GenerateError::EmptyDiff);
        }
        let diff = bundle.to_text();

        let branch = self.aggregator.common_branch(changes.clone()).await?;
        let previous_commit_messages = self
            .aggregator
            .previous_commit_messages(self.settings.previous_commit_count, changes)
            .await?;

        let context = CommitContext {
            diff: diff.clone(),
            branch,
            hint: request.hint.clone(),
            previous_commit_messages,
            locale: self.settings.locale.clone(),
            task: request.task.clone(),
        };
        let prompt = render(&self.settings.template, &context, self.sink.as_ref());
        debug!("Rendered prompt of {} bytes", prompt.len());

        Ok(PreparedPrompt { diff, prompt })
    }

    /// Generate a commit message, cancelling any job still running.
    pub async fn generate(&self, request: GenerateRequest) -> Result<String, GenerateError> {
        let job = self.begin_job();

        tokio::select! {
            biased;
            _ = job.token.cancelled() => {
                info!("Generation job {} cancelled", job.id);
                Err(GenerateError::Cancelled)
            }
            result = self.run(&request) => result,
        }
    }

    /// [`Self::generate`] on a task of its own.
    pub fn spawn(
        self: Arc<Self>,
        request: GenerateRequest,
    ) -> JoinHandle<Result<String, GenerateError>> {
        tokio::spawn(async move { self.generate(request).await })
    }

    /// Cancel the running job. Returns whether there was one.
    pub fn cancel_current(&self) -> bool {
        match self.slot().take() {
            Some((id, token)) => {
                debug!("Cancelling generation job {}", id);
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a job is in flight.
    pub fn is_busy(&self) -> bool {
        self.slot().is_some()
    }

    async fn run(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        let prepared = self.prepare(request).await?;
        let message = self.backend.resolve_and_invoke(&prepared.prompt).await?;
        Ok(message.trim().to_string())
    }

    fn slot(&self) -> MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_job(&self) -> JobGuard<'_> {
        let id = self.next_job.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();

        if let Some((previous, previous_token)) = self.slot().replace((id, token.clone())) {
            debug!("Job {} supersedes job {}", id, previous);
            previous_token.cancel();
        }

        JobGuard {
            service: self,
            id,
            token,
        }
    }
}

/// Clears the service's job slot when the job ends, if it still owns it.
struct JobGuard<'a> {
    service: &'a CommitMessageService,
    id: u64,
    token: CancellationToken,
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        let mut slot = self.service.slot();
        if slot.as_ref().is_some_and(|(id, _)| *id == self.id) {
            *slot = None;
        }
    }
}
