use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};
use std::sync::Arc;
use url::{ParseError, Url};

/// A source repository identified by owner and name.
///
/// Derived from a package homepage by taking the last two non-empty path segments, so
/// `https://github.com/psf/requests/` becomes `psf/requests`. A homepage without a scheme, such as
/// `github.com/psf/requests`, is read as an `https` URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    owner: Arc<str>,
    repo: Arc<str>,
}

impl RepoSpec {
    pub fn parse(homepage: &str) -> Result<Self> {
        let url = match Url::parse(homepage) {
            Err(ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{homepage}")),
            parsed => parsed,
        }
        .into_app_err_with(|| format!("parsing repository URL '{homepage}'"))?;

        let segments: Vec<_> = url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let [.., owner, repo] = segments.as_slice() else {
            bail!("repository URL does not name an owner and a repository: {homepage}");
        };

        let repo = repo.trim_end_matches(".git");
        if repo.is_empty() {
            bail!("repository URL has an empty repository name: {homepage}");
        }

        Ok(Self {
            owner: Arc::from(*owner),
            repo: Arc::from(repo),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
