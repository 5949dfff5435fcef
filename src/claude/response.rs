//! Parsing of `claude --output-format json` output.
//!
//! Depending on the CLI version, stdout holds either a single result object
//! or an array of stream messages of which one has `"type": "result"`.

use serde::Deserialize;
use serde_json::Value;

use crate::error::ClaudeError;

/// The result message of a CLI run.
///
/// Both fields accept any JSON primitive: an `is_error` that is not `true`
/// counts as false, and a number or boolean `result` is taken as its text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClaudeReply {
    #[serde(default, deserialize_with = "primitive_flag")]
    pub is_error: bool,
    #[serde(default, deserialize_with = "primitive_text")]
    pub result: Option<String>,
}

fn primitive_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(flag) => Ok(flag),
        Value::String(text) => Ok(text == "true"),
        Value::Null | Value::Number(_) => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "is_error is not a primitive: {}",
            truncate(&other.to_string(), 200)
        ))),
    }
}

fn primitive_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Bool(flag) => Ok(Some(flag.to_string())),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "result is not a primitive: {}",
            truncate(&other.to_string(), 200)
        ))),
    }
}

impl ClaudeReply {
    /// Locate the result message in raw stdout.
    pub fn from_stdout(stdout: &str) -> Result<Self, ClaudeError> {
        let value: Value = serde_json::from_str(stdout.trim())
            .map_err(|e| ClaudeError::MalformedResponse(e.to_string()))?;

        let message = match value {
            Value::Object(_) => value,
            Value::Array(items) => items
                .into_iter()
                .find(|item| item.get("type").and_then(Value::as_str) == Some("result"))
                .ok_or(ClaudeError::NoResultInArray)?,
            other => {
                return Err(ClaudeError::MalformedResponse(format!(
                    "expected a JSON object or array, got: {}",
                    truncate(&other.to_string(), 200)
                )));
            }
        };

        serde_json::from_value(message).map_err(|e| ClaudeError::MalformedResponse(e.to_string()))
    }

    /// The message text, or the error the CLI reported.
    pub fn into_result(self) -> Result<String, ClaudeError> {
        let result = self.result.ok_or(ClaudeError::MissingResult)?;
        if self.is_error {
            return Err(ClaudeError::ReportedError(result));
        }
        Ok(result)
    }
}

/// Parse CLI stdout into the generated text.
pub fn parse_response(stdout: &str) -> Result<String, ClaudeError> {
    ClaudeReply::from_stdout(stdout)?.into_result()
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
