//! API key lookup.

use std::collections::HashMap;
use std::env;

/// Where API keys are kept, looked up by a human-readable title.
pub trait CredentialStore: Send + Sync {
    fn get(&self, title: &str) -> Option<String>;
}

/// Reads keys from environment variables.
///
/// A title maps to its upper snake case form ending in `_API_KEY`, so
/// `Anthropic` reads `ANTHROPIC_API_KEY` and `OpenAI API key` reads
/// `OPENAI_API_KEY`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvCredentialStore;

impl CredentialStore for EnvCredentialStore {
    fn get(&self, title: &str) -> Option<String> {
        env::var(credential_env_var(title)).ok()
    }
}

/// Keys held in memory, by title.
impl CredentialStore for HashMap<String, String> {
    fn get(&self, title: &str) -> Option<String> {
        HashMap::get(self, title).cloned()
    }
}

/// The environment variable [`EnvCredentialStore`] reads for `title`.
pub fn credential_env_var(title: &str) -> String {
    let name = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join("_");

    if name.ends_with("_API_KEY") || name == "API_KEY" {
        name
    } else {
        format!("{name}_API_KEY")
    }
}
