//! Session user projection and the authentication states derived from it.

use serde::{Deserialize, Serialize};

use crate::domain::FetchError;

/// Path of the session-check endpoint, relative to the API prefix.
pub const SESSION_PATH: &str = "/auth/session";

/// Identity returned by `GET /auth/session`, login and registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Display name.
    pub name: String,
    /// Optional avatar reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Account balance, already formatted by the backend.
    pub balance: String,
    /// Account email.
    pub email: String,
}

/// Body of `POST /auth/logout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutStatus {
    /// Whether the backend ended the session.
    pub status: bool,
}

/// How UI code should treat the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState<'a> {
    /// A user is present and no error was reported.
    Authenticated(&'a SessionUser),
    /// The session check failed; render as logged out.
    Anonymous(&'a FetchError),
    /// Nothing is known yet; render a neutral placeholder.
    Pending,
}

impl<'a> SessionState<'a> {
    /// Classify a session result. An error always wins over a stale user.
    #[must_use]
    pub const fn classify(user: Option<&'a SessionUser>, error: Option<&'a FetchError>) -> Self {
        match (error, user) {
            (Some(error), _) => Self::Anonymous(error),
            (None, Some(user)) => Self::Authenticated(user),
            (None, None) => Self::Pending,
        }
    }

    /// Whether the state is [`SessionState::Authenticated`].
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}
