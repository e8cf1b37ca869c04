//! Canonical, version-prefixed API request targets.
//!
//! Every request the front-end issues goes through [`ApiPath::normalize`], so
//! the query cache can key entries by a single spelling of each endpoint.

use std::borrow::Cow;
use std::fmt;

/// Version prefix shared by every backend endpoint.
pub const API_VERSION_PREFIX: &str = "/api/v1";

/// Normalized request target such as `/api/v1/stocks`.
///
/// # Examples
/// ```
/// use frontend::domain::ApiPath;
///
/// assert_eq!(ApiPath::normalize("stocks").as_str(), "/api/v1/stocks");
/// assert_eq!(ApiPath::normalize("/api/v1/stocks").as_str(), "/api/v1/stocks");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiPath(String);

impl ApiPath {
    /// Root the path and prepend [`API_VERSION_PREFIX`] unless already present.
    ///
    /// Normalization is idempotent and never fails.
    pub fn normalize(path: impl AsRef<str>) -> Self {
        let raw = path.as_ref();
        let rooted = if raw.starts_with('/') {
            Cow::Borrowed(raw)
        } else {
            Cow::Owned(format!("/{raw}"))
        };

        if has_version_prefix(&rooted) {
            Self(rooted.into_owned())
        } else {
            Self(format!("{API_VERSION_PREFIX}{rooted}"))
        }
    }

    /// Borrow the normalized target.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper, returning the normalized target.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

// Segment-aware: `/api/v1stocks` is not prefixed.
fn has_version_prefix(path: &str) -> bool {
    path.strip_prefix(API_VERSION_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['/', '?']))
}

impl fmt::Display for ApiPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ApiPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for ApiPath {
    fn from(value: &str) -> Self {
        Self::normalize(value)
    }
}

impl From<String> for ApiPath {
    fn from(value: String) -> Self {
        Self::normalize(value)
    }
}
