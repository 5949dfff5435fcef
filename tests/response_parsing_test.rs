//! Integration tests for Claude response parsing against recorded output shapes.

mod common;

use common::{read_fixture, response_fixture};

use commitscribe::ClaudeError;
use commitscribe::claude::{ClaudeReply, parse_response};

fn parse_fixture(name: &str) -> Result<String, ClaudeError> {
    parse_response(&read_fixture(response_fixture(name)))
}

#[test]
fn test_single_result_object() {
    let message = parse_fixture("result_object.json").unwrap();
    assert_eq!(
        message,
        "Add session refresh to login flow\n\nTokens are now renewed before they expire."
    );
}

#[test]
fn test_stream_array_uses_result_message() {
    assert_eq!(parse_fixture("stream_array.json").unwrap(), "Fix typo in README");
}

#[test]
fn test_stream_array_without_result_message() {
    assert!(matches!(
        parse_fixture("stream_array_no_result.json"),
        Err(ClaudeError::NoResultInArray)
    ));
}

#[test]
fn test_reported_error_carries_cli_text() {
    let err = parse_fixture("reported_error.json").unwrap_err();
    assert!(matches!(err, ClaudeError::ReportedError(_)));
    assert_eq!(err.to_string(), "Invalid API key · Please run /login");
}

#[test]
fn test_missing_result_is_an_error() {
    assert!(matches!(
        parse_fixture("missing_result.json"),
        Err(ClaudeError::MissingResult)
    ));
}

#[test]
fn test_bare_string_is_malformed() {
    assert!(matches!(
        parse_fixture("not_an_object.json"),
        Err(ClaudeError::MalformedResponse(_))
    ));
}

#[test]
fn test_reply_keeps_error_flag() {
    let reply = ClaudeReply::from_stdout(&read_fixture(response_fixture("reported_error.json")))
        .unwrap();
    assert!(reply.is_error);
    assert!(reply.result.is_some());
}

#[test]
fn test_truncated_output_is_malformed() {
    let full = read_fixture(response_fixture("result_object.json"));
    let truncated = &full[..full.len() / 2];
    assert!(matches!(
        parse_response(truncated),
        Err(ClaudeError::MalformedResponse(_))
    ));
}
