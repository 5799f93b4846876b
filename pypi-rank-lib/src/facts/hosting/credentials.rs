use crate::Result;
use ohno::{IntoAppError, bail};
use std::fs;
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "   hosting";

/// Name of the file holding the stored hosting token.
pub const TOKEN_FILE_NAME: &str = "github_oauth_token";

const AUTH_MISSING: &str = "GitHub OAuth token not found, please run `pypi-rank auth-github` to obtain one";

/// Supplies the credential used to authenticate against the hosting API.
pub trait CredentialSource: Send + Sync {
    /// Return the credential, or an error telling the user how to obtain one.
    fn get_credential(&self) -> Result<String>;
}

/// Credential taken from an explicit token if provided, otherwise from the stored token file.
#[derive(Debug, Clone)]
pub struct StoredCredential {
    explicit: Option<String>,
    token_file: Option<PathBuf>,
}

impl StoredCredential {
    #[must_use]
    pub fn new(explicit: Option<String>, token_file: Option<PathBuf>) -> Self {
        Self {
            explicit: explicit.filter(|t| !t.trim().is_empty()),
            token_file,
        }
    }
}

impl CredentialSource for StoredCredential {
    fn get_credential(&self) -> Result<String> {
        if let Some(token) = &self.explicit {
            log::debug!(target: LOG_TARGET, "Using GitHub token supplied on the command line or environment");
            return Ok(token.trim().to_string());
        }

        let Some(path) = &self.token_file else {
            bail!("{AUTH_MISSING}");
        };

        match fs::read_to_string(path) {
            Ok(contents) if !contents.trim().is_empty() => {
                log::debug!(target: LOG_TARGET, "Using GitHub token stored at '{}'", path.display());
                Ok(contents.trim().to_string())
            }
            Ok(_) => bail!("{AUTH_MISSING}"),
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Could not read token file '{}': {e:#}", path.display());
                bail!("{AUTH_MISSING}")
            }
        }
    }
}

/// The default location of the stored token in the platform configuration directory.
#[must_use]
pub fn default_token_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "pypi-rank").map(|dirs| dirs.config_dir().join(TOKEN_FILE_NAME))
}

/// Store a token as a single-line file, creating parent directories as needed.
pub fn write_token(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_app_err_with(|| format!("creating directory '{}'", parent.display()))?;
    }

    fs::write(path, format!("{}\n", token.trim())).into_app_err_with(|| format!("writing token file '{}'", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .into_app_err_with(|| format!("restricting permissions of '{}'", path.display()))?;
    }

    Ok(())
}
