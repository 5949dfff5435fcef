//! Configuration check for the Claude CLI backend.

use tracing::debug;

use super::subprocess::run_claude;
use crate::config::ClaudeCliConfig;

/// Prompt sent to check that the CLI answers at all.
pub const VERIFY_PROMPT: &str = "Say 'OK' in exactly one word";

/// Column at which error details are wrapped for display.
pub const LABEL_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Valid,
    Invalid(String),
}

impl VerificationStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationStatus::Valid)
    }

    /// Text to show the user.
    pub fn label(&self) -> String {
        match self {
            VerificationStatus::Valid => "Configuration is valid".to_string(),
            VerificationStatus::Invalid(detail) => wrap_text(detail, LABEL_WIDTH),
        }
    }
}

/// Word-wrap `text` so no line exceeds `width` characters.
///
/// Words longer than `width` get a line of their own rather than being split.
pub fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }

    lines.join("\n")
}

/// Run the CLI once with [`VERIFY_PROMPT`] and report whether it answered.
pub async fn verify_configuration(config: &ClaudeCliConfig) -> VerificationStatus {
    match run_claude(config, VERIFY_PROMPT).await {
        Ok(reply) => {
            debug!("Verification reply: {}", reply.trim());
            VerificationStatus::Valid
        }
        Err(e) => VerificationStatus::Invalid(e.to_string()),
    }
}
