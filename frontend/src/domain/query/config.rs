//! Per-call revalidation settings.

use std::time::Duration;

use super::RetryPolicy;

/// Events delivered to the cache by the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevalidationEvent {
    /// The window or view regained focus.
    Focus,
    /// Network connectivity came back.
    Reconnect,
}

impl RevalidationEvent {
    /// Short label used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Reconnect => "reconnect",
        }
    }
}

/// Revalidation settings for one query subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryConfig {
    /// Revalidate populated entries when a new subscriber mounts.
    pub revalidate_on_mount: bool,
    /// Revalidate on [`RevalidationEvent::Focus`].
    pub revalidate_on_focus: bool,
    /// Revalidate on [`RevalidationEvent::Reconnect`].
    pub revalidate_on_reconnect: bool,
    /// Automatic triggers inside this window after a settled fetch are ignored.
    pub dedupe_interval: Duration,
    /// Backoff applied to automatic triggers after failures.
    pub retry: RetryPolicy,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            revalidate_on_mount: true,
            revalidate_on_focus: true,
            revalidate_on_reconnect: true,
            dedupe_interval: Duration::from_secs(2),
            retry: RetryPolicy::default(),
        }
    }
}

impl QueryConfig {
    /// Settings for the session check: mount only, no focus or reconnect.
    #[must_use]
    pub fn session_check() -> Self {
        Self {
            revalidate_on_focus: false,
            revalidate_on_reconnect: false,
            ..Self::default()
        }
    }

    /// Whether this subscription wants a revalidation for `event`.
    #[must_use]
    pub const fn revalidates_on(&self, event: RevalidationEvent) -> bool {
        match event {
            RevalidationEvent::Focus => self.revalidate_on_focus,
            RevalidationEvent::Reconnect => self.revalidate_on_reconnect,
        }
    }
}
