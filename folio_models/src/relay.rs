use std::{ops::Deref, sync::LazyLock};

use regex::Regex;
use thiserror::Error;
use url::Url;

pub static FORMSPREE_ENDPOINT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://formspree\.io/f/[-a-zA-Z0-9]+$").unwrap());

/// A validated Formspree form endpoint (`https://formspree.io/f/<id>`).
#[derive(Clone, PartialEq, Eq)]
pub struct RelayEndpoint(Url);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RelayEndpointIssue {
    #[error("The relay endpoint is not configured.")]
    Missing,
    #[error("The relay endpoint does not have the expected format.")]
    InvalidFormat,
}

impl RelayEndpoint {
    /// Validates a raw configuration value. Surrounding whitespace is ignored
    /// and a blank value counts as missing.
    pub fn parse(raw: Option<&str>) -> Result<Self, RelayEndpointIssue> {
        let raw = raw
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or(RelayEndpointIssue::Missing)?;

        if !FORMSPREE_ENDPOINT_REGEX.is_match(raw) {
            return Err(RelayEndpointIssue::InvalidFormat);
        }

        raw.parse()
            .map(Self)
            .map_err(|_| RelayEndpointIssue::InvalidFormat)
    }

    /// The form id, i.e. the last path segment.
    pub fn form_id(&self) -> &str {
        self.0
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for RelayEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RelayEndpoint")
            .field(&self.0.as_str())
            .finish()
    }
}

impl std::fmt::Display for RelayEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.as_str().fmt(f)
    }
}

impl Deref for RelayEndpoint {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
