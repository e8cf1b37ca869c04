//! Single-request fetch client.
//!
//! Normalizes the target, layers caller headers over the JSON defaults,
//! sends through the [`HttpTransport`] port and turns the response into
//! either decoded data or a [`FetchError`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::domain::error::classify_error_body;
use crate::domain::ports::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, RequestHeaders, SessionProbe,
};
use crate::domain::session::SESSION_PATH;
use crate::domain::{ApiPath, ClientError, FetchError};

const JSON_CONTENT_TYPE: &str = "application/json";
const REDACTED: &str = "<redacted>";

/// Per-request options supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// HTTP method; defaults to GET.
    pub method: HttpMethod,
    /// Caller headers, layered over the defaults.
    pub headers: RequestHeaders,
    /// Serialized body.
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    /// Plain GET.
    #[must_use]
    pub fn get() -> Self {
        Self::default()
    }

    /// POST without a body.
    #[must_use]
    pub fn post() -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::default()
        }
    }

    /// POST with a JSON body.
    ///
    /// # Errors
    /// Returns [`ClientError::Validation`] when `body` cannot be serialised.
    pub fn post_json<B: Serialize + ?Sized>(body: &B) -> Result<Self, ClientError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|err| ClientError::validation(format!("request body: {err}")))?;
        Ok(Self {
            method: HttpMethod::Post,
            body: Some(bytes),
            ..Self::default()
        })
    }

    /// Add a caller header.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Fetch client over an [`HttpTransport`].
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use frontend::domain::{FetchClient, RequestOptions, Stock};
/// use frontend::outbound::http::ReqwestTransport;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let origin = url::Url::parse("http://127.0.0.1:5000")?;
/// let transport = ReqwestTransport::new(origin, Duration::from_secs(10))?;
/// let client = FetchClient::new(Arc::new(transport));
/// let stocks: Vec<Stock> = client.fetch("stocks", RequestOptions::get()).await?;
/// # drop(stocks);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn HttpTransport>,
}

impl FetchClient {
    /// Create a client over `transport`.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Fetch `path` and decode the JSON body into `D`.
    ///
    /// # Errors
    /// Returns [`FetchError::Api`] or [`FetchError::MalformedErrorResponse`]
    /// for non-2xx responses and [`FetchError::Client`] for transport or
    /// decode failures.
    pub async fn fetch<D: DeserializeOwned>(
        &self,
        path: impl AsRef<str> + Send,
        options: RequestOptions,
    ) -> Result<D, FetchError> {
        let value = self.fetch_value(path, options).await?;
        decode_value(value)
    }

    /// Fetch `path` and return the raw JSON body.
    ///
    /// # Errors
    /// See [`FetchClient::fetch`].
    pub async fn fetch_value(
        &self,
        path: impl AsRef<str> + Send,
        options: RequestOptions,
    ) -> Result<Value, FetchError> {
        let request = build_request(ApiPath::normalize(path), options);
        debug!(
            method = %request.method,
            target = %request.target,
            headers = ?redacted_headers(&request.headers),
            "sending api request"
        );
        let response = self.transport.send(request).await?;
        read_response(&response)
    }
}

#[async_trait]
impl SessionProbe for FetchClient {
    async fn check_session(&self, cookie_header: &str) -> Result<(), FetchError> {
        let mut options = RequestOptions::get();
        if !cookie_header.is_empty() {
            options = options.with_header("cookie", cookie_header);
        }
        self.fetch_value(SESSION_PATH, options).await.map(drop)
    }
}

fn build_request(target: ApiPath, options: RequestOptions) -> ApiRequest {
    let RequestOptions {
        method,
        headers,
        body,
    } = options;
    let defaults = RequestHeaders::new().with("content-type", JSON_CONTENT_TYPE);
    ApiRequest {
        method,
        target,
        headers: headers.merged_over(defaults),
        body,
    }
}

fn redacted_headers(headers: &RequestHeaders) -> Vec<(&str, &str)> {
    headers
        .iter()
        .map(|(name, value)| {
            if name == "cookie" || name == "authorization" {
                (name, REDACTED)
            } else {
                (name, value)
            }
        })
        .collect()
}

fn read_response(response: &ApiResponse) -> Result<Value, FetchError> {
    if !response.is_success() {
        return Err(classify_error_body(response.status, &response.body));
    }
    serde_json::from_slice(&response.body).map_err(|err| {
        ClientError::decode(format!("status {}: {err}", response.status)).into()
    })
}

pub(crate) fn decode_value<D: DeserializeOwned>(value: Value) -> Result<D, FetchError> {
    serde_json::from_value(value).map_err(|err| ClientError::decode(err.to_string()).into())
}
