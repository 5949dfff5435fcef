//! Backend selection for message generation.

pub mod backend;
pub mod credentials;

pub use backend::{ApiBackend, ApiTransport, Backend, summarize_error};
pub use credentials::{CredentialStore, EnvCredentialStore, credential_env_var};
