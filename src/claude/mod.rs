//! Claude Code CLI integration.

pub mod response;
pub mod subprocess;
pub mod verify;

pub use response::{ClaudeReply, parse_response};
pub use subprocess::{CliInvocation, ProcessOutput, build_args, resolve_executable, run_claude};
pub use verify::{VerificationStatus, verify_configuration};
