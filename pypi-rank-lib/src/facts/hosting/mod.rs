//! Source repository metadata from the GitHub REST API, plus the credential plumbing it needs.

mod credentials;
mod device_flow;
mod provider;
mod repo_metadata;

pub use credentials::{CredentialSource, StoredCredential, TOKEN_FILE_NAME, default_token_path, write_token};
pub use device_flow::{DEFAULT_AUTH_URL, DEFAULT_CLIENT_ID, DeviceFlow, VerificationCodes};
pub use provider::Provider;
pub use repo_metadata::RepoMetadata;
