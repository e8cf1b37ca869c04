//! Session accessor: the query cache pinned to the session-check endpoint.

use tracing::debug;

use crate::domain::query::{QueryCache, QueryConfig, QueryHandle, QuerySnapshot};
use crate::domain::session::{SESSION_PATH, SessionState, SessionUser};
use crate::domain::{ApiPath, AuthApi, FetchError, LogoutStatus, RequestOptions};

/// Session view used by header and profile widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current user; always `None` while `error` is set.
    pub user: Option<SessionUser>,
    /// Why the session check failed.
    pub error: Option<FetchError>,
    /// First check still outstanding.
    pub is_loading: bool,
}

impl SessionSnapshot {
    /// Classify for rendering.
    #[must_use]
    pub fn state(&self) -> SessionState<'_> {
        SessionState::classify(self.user.as_ref(), self.error.as_ref())
    }
}

impl From<QuerySnapshot<SessionUser>> for SessionSnapshot {
    fn from(snapshot: QuerySnapshot<SessionUser>) -> Self {
        let QuerySnapshot {
            data,
            error,
            is_loading,
            ..
        } = snapshot;
        let user = if error.is_some() { None } else { data };
        Self {
            user,
            error,
            is_loading,
        }
    }
}

/// Live subscription to the session check.
pub struct SessionHandle {
    inner: QueryHandle<SessionUser>,
}

impl SessionHandle {
    /// Current session view.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot().into()
    }

    /// Re-run the session check now.
    pub async fn mutate(&self) -> SessionSnapshot {
        self.inner.mutate().await.into()
    }

    /// Wait for the next change; `None` once the cache shut down.
    pub async fn changed(&mut self) -> Option<SessionSnapshot> {
        self.inner.changed().await.map(Into::into)
    }

    /// Wait until the check is idle; `None` once the cache shut down.
    pub async fn settled(&mut self) -> Option<SessionSnapshot> {
        self.inner.settled().await.map(Into::into)
    }
}

/// Entry point for session-aware UI.
#[derive(Clone)]
pub struct SessionAccessor {
    cache: QueryCache,
    config: QueryConfig,
}

impl SessionAccessor {
    /// Accessor revalidating on mount only.
    pub fn new(cache: QueryCache) -> Self {
        Self::with_config(cache, QueryConfig::session_check())
    }

    /// Accessor with explicit revalidation settings.
    pub const fn with_config(cache: QueryCache, config: QueryConfig) -> Self {
        Self { cache, config }
    }

    /// Subscribe to the session check.
    #[must_use]
    pub fn get_session(&self) -> SessionHandle {
        SessionHandle {
            inner: self
                .cache
                .query(SESSION_PATH, RequestOptions::get(), self.config),
        }
    }

    /// Log out through `auth`, then re-run the session check so subscribers
    /// flip to anonymous.
    ///
    /// # Errors
    /// Returns the logout request's [`FetchError`]; the session check runs
    /// either way.
    pub async fn logout(&self, auth: &AuthApi) -> Result<LogoutStatus, FetchError> {
        let status = auth.logout().await;
        if let Err(error) = self.cache.mutate(&ApiPath::normalize(SESSION_PATH)).await {
            debug!(error = %error, "session check after logout failed");
        }
        status
    }
}
