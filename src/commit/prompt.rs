//! Prompt template rendering.
//!
//! Tokens are plain `{name}` placeholders. Unknown tokens pass through
//! untouched, so a template may contain literal braces. The template is
//! scanned once; substituted values are never scanned again, so a hint or a
//! commit message that mentions `{diff}` stays literal.

use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

use super::context::CommitContext;
use crate::notify::{Advisory, AdvisorySink};

const TASK_TOKENS: [&str; 4] = ["taskId", "taskSummary", "taskDescription", "taskTimeSpent"];

/// Branch name used when the changes share no branch.
pub const FALLBACK_BRANCH: &str = "main";

/// A recognized token, or a brace group mentioning `$hint` such as
/// `{Note: $hint}`. Only tokens capture group 1.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\{(locale|branch|hint|previousCommitMessages",
        r"|taskId|taskSummary|taskDescription|taskTimeSpent|diff)\}",
        r"|\{[^{}]*\$hint[^{}]*\}",
    ))
    .expect("Invalid regex")
});

/// Names of the recognized tokens in `template`, in order of appearance.
fn token_names(template: &str) -> Vec<&str> {
    TOKEN
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|name| name.as_str()))
        .collect()
}

/// With a hint, `{Note: $hint}` becomes `Note: <hint>`; without one the
/// whole group disappears.
fn expand_hint_group(group: &str, hint: Option<&str>) -> String {
    match hint {
        Some(hint) => group[1..group.len() - 1].replace("$hint", hint),
        None => String::new(),
    }
}

/// One pass over `template`. `{diff}` is only replaced when `diff` is given.
///
/// Sends [`Advisory::NoCommonBranch`] when `{branch}` has no branch to show
/// and [`Advisory::NoTaskManager`] when task tokens have no task; task
/// tokens then stay in place.
fn expand(
    template: &str,
    context: &CommitContext,
    diff: Option<&str>,
    sink: &dyn AdvisorySink,
) -> String {
    let names = token_names(template);

    let branch = match context.branch.as_deref() {
        Some(branch) => branch,
        None => {
            if names.contains(&"branch") {
                sink.send(Advisory::NoCommonBranch);
            }
            FALLBACK_BRANCH
        }
    };
    let task = context.task.as_ref();
    if task.is_none() && names.iter().any(|name| TASK_TOKENS.contains(name)) {
        sink.send(Advisory::NoTaskManager);
    }
    let hint = context.effective_hint();

    TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            let Some(name) = caps.get(1) else {
                return expand_hint_group(&caps[0], hint);
            };
            match (name.as_str(), task) {
                ("locale", _) => context.locale.display_language(),
                ("branch", _) => branch.to_string(),
                ("hint", _) => hint.unwrap_or_default().to_string(),
                ("previousCommitMessages", _) => context.previous_commit_messages.join("\n"),
                ("diff", _) => diff.unwrap_or(&caps[0]).to_string(),
                ("taskId", Some(task)) => task.id.clone(),
                ("taskSummary", Some(task)) => task.summary.clone(),
                ("taskDescription", Some(task)) => task.description.clone().unwrap_or_default(),
                ("taskTimeSpent", Some(task)) => task.format_time_spent(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Every substitution except the diff.
///
/// Applying it to output that holds no recognized token changes nothing.
pub fn substitute_tokens(
    template: &str,
    context: &CommitContext,
    sink: &dyn AdvisorySink,
) -> String {
    expand(template, context, None, sink)
}

/// Render the final prompt.
///
/// The diff replaces `{diff}`; a template without the token gets the diff
/// appended on a new line.
pub fn render(template: &str, context: &CommitContext, sink: &dyn AdvisorySink) -> String {
    let rendered = expand(template, context, Some(&context.diff), sink);
    if token_names(template).contains(&"diff") {
        rendered
    } else {
        format!("{rendered}\n{}", context.diff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commit::context::{Locale, TaskInfo};
    use crate::notify::CollectingSink;
    use std::time::Duration;

    fn context() -> CommitContext {
        CommitContext {
            diff: "D".to_string(),
            ..Default::default()
        }
    }

    fn hinted(hint: &str) -> CommitContext {
        CommitContext {
            hint: Some(hint.to_string()),
            ..context()
        }
    }

    fn task() -> TaskInfo {
        TaskInfo {
            id: "PROJ-42".to_string(),
            summary: "Fix login".to_string(),
            description: Some("Session expires too early".to_string()),
            time_spent: Duration::from_secs(3900),
        }
    }

    fn substitute(template: &str, context: &CommitContext) -> String {
        substitute_tokens(template, context, &CollectingSink::new())
    }

    #[test]
    fn test_hint_group_with_hint() {
        assert_eq!(substitute("{note: $hint}", &hinted("urgent")), "note: urgent");
    }

    #[test]
    fn test_hint_group_without_hint_is_removed() {
        assert_eq!(substitute("{note: $hint}", &context()), "");
        assert_eq!(substitute("{note: $hint}", &hinted("")), "");
        assert_eq!(substitute("a{ (hint: $hint)}b", &hinted("  ")), "ab");
    }

    #[test]
    fn test_bare_hint_token() {
        assert_eq!(substitute("Hint: {hint}.", &hinted("x")), "Hint: x.");
        assert_eq!(substitute("Hint: {hint}.", &context()), "Hint: .");
    }

    #[test]
    fn test_multiple_hint_groups() {
        assert_eq!(substitute("{A=$hint} and {B=$hint}", &hinted("h")), "A=h and B=h");
    }

    #[test]
    fn test_missing_branch_falls_back_with_advisory() {
        let sink = CollectingSink::new();
        assert_eq!(substitute_tokens("on {branch}", &context(), &sink), "on main");
        assert_eq!(sink.received(), vec![Advisory::NoCommonBranch]);
    }

    #[test]
    fn test_no_branch_advisory_without_token() {
        let sink = CollectingSink::new();
        assert_eq!(substitute_tokens("no token", &context(), &sink), "no token");
        assert!(sink.received().is_empty());
    }

    #[test]
    fn test_render_appends_diff_without_token() {
        let sink = CollectingSink::new();
        assert_eq!(render("Summarize", &context(), &sink), "Summarize\nD");
    }

    #[test]
    fn test_render_replaces_diff_token() {
        let sink = CollectingSink::new();
        assert_eq!(
            render("Changes:\n{diff}\nEnd", &context(), &sink),
            "Changes:\nD\nEnd"
        );
    }

    #[test]
    fn test_render_full_template() {
        let sink = CollectingSink::new();
        let context = CommitContext {
            diff: "+fn main() {}".to_string(),
            branch: Some("feature/login".to_string()),
            hint: Some("mention the session fix".to_string()),
            previous_commit_messages: vec!["Add login".to_string(), "Init".to_string()],
            locale: Locale::parse("fr-FR"),
            task: Some(task()),
        };
        let template = "Write in {locale} for {branch}.{ Hint: $hint.}\n\
                        Recent:\n{previousCommitMessages}\n\
                        Task {taskId}: {taskSummary} ({taskTimeSpent})\n{diff}";

        let prompt = render(template, &context, &sink);

        assert_eq!(
            prompt,
            "Write in French for feature/login. Hint: mention the session fix.\n\
             Recent:\nAdd login\nInit\n\
             Task PROJ-42: Fix login (1h 5m)\n+fn main() {}"
        );
        assert!(sink.received().is_empty());
    }

    #[test]
    fn test_task_tokens_without_task_stay_with_advisory() {
        let sink = CollectingSink::new();
        let rendered = substitute_tokens("Task {taskId}", &context(), &sink);

        assert_eq!(rendered, "Task {taskId}");
        assert_eq!(sink.received(), vec![Advisory::NoTaskManager]);
    }

    #[test]
    fn test_task_description_defaults_to_empty() {
        let mut task = task();
        task.description = None;
        let context = CommitContext {
            task: Some(task),
            ..context()
        };

        assert_eq!(substitute("[{taskDescription}]", &context), "[]");
    }

    #[test]
    fn test_unknown_tokens_pass_through() {
        assert_eq!(substitute("{unknown} {locale}", &context()), "{unknown} English");
    }

    #[test]
    fn test_commit_message_mentioning_diff_token_stays_literal() {
        let sink = CollectingSink::new();
        let context = CommitContext {
            previous_commit_messages: vec!["Support {diff} placeholder".to_string()],
            ..context()
        };

        assert_eq!(
            render("Recent: {previousCommitMessages}", &context, &sink),
            "Recent: Support {diff} placeholder\nD"
        );
    }

    #[test]
    fn test_hint_mentioning_tokens_is_not_expanded() {
        let sink = CollectingSink::new();
        let context = CommitContext {
            branch: Some("dev".to_string()),
            ..hinted("keep {branch} out of {taskId}")
        };

        let rendered = substitute_tokens("On {branch}.{ Note: $hint}", &context, &sink);

        assert_eq!(rendered, "On dev. Note: keep {branch} out of {taskId}");
        assert!(sink.received().is_empty());
    }

    #[test]
    fn test_substitute_tokens_is_idempotent() {
        let sink = CollectingSink::new();
        let context = CommitContext {
            branch: Some("dev".to_string()),
            hint: Some("keep it short".to_string()),
            previous_commit_messages: vec!["Earlier".to_string()],
            task: Some(task()),
            ..context()
        };
        let template = "{locale} {branch} {Hint: $hint} {hint} {previousCommitMessages} \
                        {taskId} {taskSummary} {taskDescription} {taskTimeSpent} {other}";

        let once = substitute_tokens(template, &context, &sink);
        let twice = substitute_tokens(&once, &context, &sink);

        assert_eq!(once, twice);
    }
}
