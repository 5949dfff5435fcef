//! Everything a prompt is rendered from.

use std::time::Duration;

/// A language tag such as `en` or `de-AT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    tag: String,
}

impl Locale {
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim().replace('_', "-");
        Self {
            tag: if tag.is_empty() { "en".to_string() } else { tag },
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The language's name in English, e.g. `English` for `en-US`.
    ///
    /// Languages without a known name render as their tag.
    pub fn display_language(&self) -> String {
        let language = self
            .tag
            .split('-')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        let name = match language.as_str() {
            "ar" => "Arabic",
            "cs" => "Czech",
            "da" => "Danish",
            "de" => "German",
            "el" => "Greek",
            "en" => "English",
            "es" => "Spanish",
            "fi" => "Finnish",
            "fr" => "French",
            "he" => "Hebrew",
            "hi" => "Hindi",
            "hu" => "Hungarian",
            "id" => "Indonesian",
            "it" => "Italian",
            "ja" => "Japanese",
            "ko" => "Korean",
            "nb" | "no" => "Norwegian",
            "nl" => "Dutch",
            "pl" => "Polish",
            "pt" => "Portuguese",
            "ro" => "Romanian",
            "ru" => "Russian",
            "sk" => "Slovak",
            "sv" => "Swedish",
            "th" => "Thai",
            "tr" => "Turkish",
            "uk" => "Ukrainian",
            "vi" => "Vietnamese",
            "zh" => "Chinese",
            _ => return self.tag.clone(),
        };
        name.to_string()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::parse("en")
    }
}

/// The task the user is currently working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub time_spent: Duration,
}

impl TaskInfo {
    /// Time spent as `1h 5m`, `12m 3s` or `45s`.
    pub fn format_time_spent(&self) -> String {
        format_duration(self.time_spent)
    }
}

fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 && hours == 0 {
        parts.push(format!("{seconds}s"));
    }

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Inputs to template rendering. Built once per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitContext {
    pub diff: String,
    pub branch: Option<String>,
    pub hint: Option<String>,
    /// Most recent first.
    pub previous_commit_messages: Vec<String>,
    pub locale: Locale,
    pub task: Option<TaskInfo>,
}

impl CommitContext {
    /// The hint, if it has any visible content.
    pub fn effective_hint(&self) -> Option<&str> {
        self.hint.as_deref().filter(|hint| !hint.trim().is_empty())
    }
}
