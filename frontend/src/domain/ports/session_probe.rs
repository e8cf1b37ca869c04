//! Port used by the edge redirect guard to ask the backend whether a
//! forwarded cookie jar belongs to a live session.

use async_trait::async_trait;

use crate::domain::FetchError;

/// Session check against the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionProbe: Send + Sync {
    /// Succeed when the backend accepts `cookie_header` as a valid session.
    ///
    /// `cookie_header` is the jar formatted as `name=value; name=value`; an
    /// empty string means the caller sent no cookies.
    async fn check_session(&self, cookie_header: &str) -> Result<(), FetchError>;
}
