//! The backends a prompt can be sent to.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::credentials::CredentialStore;
use crate::claude::{self, VerificationStatus};
use crate::config::ClaudeCliConfig;
use crate::error::{ApiError, BackendError, ClaudeError};

/// A network LLM API. Only the interface lives here.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Provider name used in messages, e.g. `OpenAI`.
    fn provider_name(&self) -> &str;

    /// Title under which the API key is stored.
    fn credential_title(&self) -> &str;

    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, ApiError>;
}

/// An API transport paired with the store holding its key.
#[derive(Clone)]
pub struct ApiBackend {
    transport: Arc<dyn ApiTransport>,
    credentials: Arc<dyn CredentialStore>,
}

impl ApiBackend {
    pub fn new(transport: Arc<dyn ApiTransport>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.transport.provider_name()
    }

    /// Look up the key, then call the transport. No key, no request.
    pub async fn invoke(&self, prompt: &str) -> Result<String, ApiError> {
        let title = self.transport.credential_title();
        let api_key = self
            .credentials
            .get(title)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ApiError::MissingCredential(title.to_string()))?;

        debug!("Sending prompt to {}", self.provider_name());
        self.transport.complete(&api_key, prompt).await
    }
}

impl fmt::Debug for ApiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiBackend")
            .field("provider", &self.provider_name())
            .finish_non_exhaustive()
    }
}

/// Where prompts go.
#[derive(Debug, Clone)]
pub enum Backend {
    ClaudeCli(ClaudeCliConfig),
    Api(ApiBackend),
}

impl Backend {
    pub fn name(&self) -> &str {
        match self {
            Backend::ClaudeCli(_) => "Claude Code",
            Backend::Api(api) => api.provider_name(),
        }
    }

    /// Send `prompt` and return the generated text.
    pub async fn resolve_and_invoke(&self, prompt: &str) -> Result<String, BackendError> {
        match self {
            Backend::ClaudeCli(config) => Ok(claude::run_claude(config, prompt).await?),
            Backend::Api(api) => Ok(api.invoke(prompt).await?),
        }
    }

    /// Send the verification prompt and report whether an answer came back.
    pub async fn verify(&self) -> VerificationStatus {
        match self {
            Backend::ClaudeCli(config) => claude::verify_configuration(config).await,
            Backend::Api(api) => match api.invoke(claude::verify::VERIFY_PROMPT).await {
                Ok(_) => VerificationStatus::Valid,
                Err(e) => VerificationStatus::Invalid(e.to_string()),
            },
        }
    }
}

/// One-line description of a backend failure.
pub fn summarize_error(err: &BackendError) -> String {
    match err {
        BackendError::Claude(err) => match err {
            ClaudeError::ExecutableNotFound | ClaudeError::NotExecutable(_) => {
                "Claude CLI not found".to_string()
            }
            ClaudeError::SpawnFailed(_) | ClaudeError::WaitFailed(_) => {
                "Failed to run Claude CLI".to_string()
            }
            ClaudeError::Timeout(secs) => format!("Claude timed out after {}s", secs),
            ClaudeError::OutputReadError(_) => "Failed to read Claude CLI output".to_string(),
            ClaudeError::NonZeroExit { code, .. } => {
                format!("Claude CLI exited with code {}", code)
            }
            ClaudeError::MalformedResponse(_)
            | ClaudeError::NoResultInArray
            | ClaudeError::MissingResult => "Claude returned an unexpected response".to_string(),
            ClaudeError::ReportedError(_) => "Claude reported an error".to_string(),
        },
        BackendError::Api(ApiError::MissingCredential(title)) => {
            format!("No API key for {}", title)
        }
        BackendError::Api(ApiError::RequestFailed { provider, .. }) => {
            format!("{} request failed", provider)
        }
    }
}
