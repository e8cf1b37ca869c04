//! Failure values produced by the fetch layer.
//!
//! A request either reaches the backend and is rejected ([`ApiError`]), fails
//! locally ([`ClientError`]), or is rejected with a body this crate cannot
//! interpret ([`FetchError::MalformedErrorResponse`]). All three are cloneable
//! so a single cached result can be handed to every subscriber of a query.

use serde::{Deserialize, Serialize};

use crate::domain::ports::{TransportError, define_port_error};

/// Structured failure returned by the backend.
///
/// Serialises to the same `{message, status}` shape the backend emits.
///
/// # Examples
/// ```
/// use frontend::domain::ApiError;
///
/// let error = ApiError::new(404, "not found");
/// assert_eq!(error.status(), 404);
/// assert_eq!(error.to_string(), "not found (status 404)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message} (status {status})")]
pub struct ApiError {
    message: String,
    status: u16,
}

impl ApiError {
    /// Construct an API error.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Status code reported by the backend.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }
}

define_port_error! {
    /// Failures that originate before, or without, a server response.
    pub enum ClientError {
        /// Input rejected before any request was sent.
        Validation { message: String } => "{message}",
        /// The request never produced a response.
        Transport { message: String } => "request failed: {message}",
        /// The request exceeded its deadline.
        Timeout { message: String } => "request timed out: {message}",
        /// A success response did not decode into the expected shape.
        Decode { message: String } => "response could not be decoded: {message}",
    }
}

impl ClientError {
    /// Message carried by every client error variant.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Validation { message }
            | Self::Transport { message }
            | Self::Timeout { message }
            | Self::Decode { message } => message,
        }
    }
}

impl From<TransportError> for ClientError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Timeout { message } => Self::timeout(message),
            TransportError::Connect { message } | TransportError::InvalidTarget { message } => {
                Self::transport(message)
            }
        }
    }
}

/// Any failure of a fetch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The backend rejected the request with a well-formed error body.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// The request failed locally.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The backend rejected the request with a body of unknown shape.
    #[error("malformed error response (status {status}): {preview}")]
    MalformedErrorResponse {
        /// HTTP status of the response.
        status: u16,
        /// Whitespace-compacted, truncated body text.
        preview: String,
    },
}

impl FetchError {
    /// The API error, when the backend produced one.
    #[must_use]
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(error) => Some(error),
            Self::Client(_) | Self::MalformedErrorResponse { .. } => None,
        }
    }

    /// Status code for server-side failures; `None` for client errors.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(error) => Some(error.status()),
            Self::MalformedErrorResponse { status, .. } => Some(*status),
            Self::Client(_) => None,
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(error: TransportError) -> Self {
        Self::Client(error.into())
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<u16>,
}

/// Map a failure response body onto a [`FetchError`].
///
/// Bodies shaped like `{message, status?}` become [`ApiError`]; the body's
/// status wins over the HTTP status when present. Anything else becomes
/// [`FetchError::MalformedErrorResponse`].
#[must_use]
pub fn classify_error_body(http_status: u16, body: &[u8]) -> FetchError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => FetchError::Api(ApiError::new(
            parsed.status.unwrap_or(http_status),
            parsed.message,
        )),
        Err(_) => FetchError::MalformedErrorResponse {
            status: http_status,
            preview: body_preview(body),
        },
    }
}

pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
