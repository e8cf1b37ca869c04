//! Port abstraction for issuing HTTP requests against the backend API.

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::ApiPath;

/// HTTP methods used by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    /// Read a resource.
    #[default]
    Get,
    /// Submit a body, such as credentials.
    Post,
    /// Replace a resource.
    Put,
    /// Partially update a resource.
    Patch,
    /// Remove a resource.
    Delete,
}

impl HttpMethod {
    /// Upper-case wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request headers keyed by lower-cased name.
///
/// # Examples
/// ```
/// use frontend::domain::ports::RequestHeaders;
///
/// let headers = RequestHeaders::new().with("Content-Type", "text/plain");
/// assert_eq!(headers.get("content-type"), Some("text/plain"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestHeaders(BTreeMap<String, String>);

impl RequestHeaders {
    /// Create an empty header set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`RequestHeaders::insert`].
    #[must_use]
    pub fn with(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a header, returning the value it replaced.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into())
    }

    /// Look up a header by case-insensitive name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Layer these headers over `defaults`; entries in `self` win.
    #[must_use]
    pub fn merged_over(self, defaults: Self) -> Self {
        let mut merged = defaults.0;
        merged.extend(self.0);
        Self(merged)
    }

    /// Iterate headers in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no headers are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Outgoing request handed to an [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Normalized target, relative to the backend origin.
    pub target: ApiPath,
    /// Fully merged request headers.
    pub headers: RequestHeaders,
    /// Serialized request body, if any.
    pub body: Option<Vec<u8>>,
}

/// Raw response returned by an [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Undecoded response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Build a response from a status and a JSON value.
    #[must_use]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

define_port_error! {
    /// Errors raised before a response reaches the fetch client.
    pub enum TransportError {
        /// The request target could not be resolved against the backend origin.
        InvalidTarget { message: String } =>
            "invalid request target: {message}",
        /// The connection failed or was interrupted.
        Connect { message: String } =>
            "backend request failed: {message}",
        /// The request exceeded its deadline.
        Timeout { message: String } =>
            "backend request timed out: {message}",
    }
}

/// Port for sending API requests to the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request and return the raw response, whatever its status.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[test]
    fn header_names_are_case_insensitive() {
        let mut headers = RequestHeaders::new();
        assert_eq!(headers.insert("X-Trace", "a"), None);
        assert_eq!(headers.insert("x-trace", "b"), Some("a".to_owned()));
        assert_eq!(headers.get("X-TRACE"), Some("b"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn merged_headers_prefer_caller_values() {
        let defaults = RequestHeaders::new()
            .with("content-type", "application/json")
            .with("accept", "application/json");
        let caller = RequestHeaders::new().with("Content-Type", "text/plain");

        let merged = caller.merged_over(defaults);

        assert_eq!(merged.get("content-type"), Some("text/plain"));
        assert_eq!(merged.get("accept"), Some("application/json"));
        assert_eq!(merged.len(), 2);
    }

    #[rstest]
    #[case(200, true)]
    #[case(204, true)]
    #[case(299, true)]
    #[case(304, false)]
    #[case(401, false)]
    #[case(500, false)]
    fn success_covers_the_2xx_range(#[case] status: u16, #[case] expected: bool) {
        let response = ApiResponse {
            status,
            body: Vec::new(),
        };
        assert_eq!(response.is_success(), expected);
    }

    #[test]
    fn methods_render_wire_names() {
        assert_eq!(HttpMethod::default().as_str(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }
}
