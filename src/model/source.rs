use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::DotnetGetError;

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ssh", "git", "file"];

static SCP_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._-]+@[A-Za-z0-9.-]+:[^\s]+$").expect("valid scp-like regex")
});

/// A repository location accepted by `git clone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSource(String);

impl RepoSource {
    pub fn parse(raw: &str) -> Result<Self, DotnetGetError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DotnetGetError::InvalidSource("empty URL".to_string()));
        }

        if SCP_LIKE_RE.is_match(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }

        if let Ok(url) = Url::parse(trimmed) {
            if ALLOWED_SCHEMES.contains(&url.scheme()) && (url.has_host() || url.scheme() == "file")
            {
                return Ok(Self(trimmed.to_string()));
            }
            // Windows drive letters parse as a one-letter scheme.
            if url.scheme().len() > 1 {
                return Err(DotnetGetError::InvalidSource(format!(
                    "unsupported scheme '{}' in {trimmed}",
                    url.scheme()
                )));
            }
        }

        if Path::new(trimmed).is_dir() {
            return Ok(Self(trimmed.to_string()));
        }

        Err(DotnetGetError::InvalidSource(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
