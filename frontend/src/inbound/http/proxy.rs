//! Reverse proxy for API and page traffic.
//!
//! Browsers talk to a single origin. Requests under `/api/v1` are rewritten
//! to the backend; everything else goes to the page renderer when one is
//! configured. Hop-by-hop headers are stripped in both directions and
//! upstream failures are answered with the backend's `{message, status}`
//! error shape.

use std::time::Duration;

use actix_web::http::StatusCode;
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, web};
use reqwest::Client;
use tracing::warn;
use url::Url;

use crate::domain::ApiError;
use crate::inbound::http::ApiResult;

/// Headers that describe one connection rather than the message.
pub const HOP_HEADERS: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

/// Route pattern matched by [`forward_api`].
pub const API_ROUTE: &str = "/api/v1/{tail:.*}";

/// Upstream origins and the client used to reach them.
#[derive(Clone)]
pub struct EdgeProxy {
    client: Client,
    server_url: Url,
    pages_url: Option<Url>,
}

impl EdgeProxy {
    /// Proxy to `server_url` for API calls and `pages_url` for pages.
    ///
    /// Redirects are handed back to the browser rather than followed. Both
    /// URLs are origins: the request path replaces any path they carry.
    ///
    /// # Errors
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        server_url: Url,
        pages_url: Option<Url>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            client,
            server_url,
            pages_url,
        })
    }

    async fn forward(
        &self,
        origin: &Url,
        req: &HttpRequest,
        body: web::Bytes,
    ) -> Result<HttpResponse, ForwardError> {
        let target = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.path(), |path_and_query| path_and_query.as_str());
        let url = origin
            .join(target)
            .map_err(|error| ForwardError::Target(error.to_string()))?;
        let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
            .map_err(|error| ForwardError::Target(error.to_string()))?;

        let mut upstream = self.client.request(method, url);
        for (name, value) in req.headers() {
            if !is_hop_header(name.as_str()) {
                upstream = upstream.header(name.as_str(), value.as_bytes());
            }
        }
        if !body.is_empty() {
            upstream = upstream.body(body);
        }

        let response = upstream
            .send()
            .await
            .map_err(|error| ForwardError::Upstream(error.to_string()))?;
        let status = StatusCode::from_u16(response.status().as_u16())
            .map_err(|error| ForwardError::Upstream(error.to_string()))?;
        let mut downstream = HttpResponse::build(status);
        for (name, value) in response.headers() {
            if is_hop_header(name.as_str()) {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_str().as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) {
                downstream.append_header((name, value));
            }
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|error| ForwardError::Upstream(error.to_string()))?;
        Ok(downstream.body(bytes))
    }
}

enum ForwardError {
    Target(String),
    Upstream(String),
}

impl ForwardError {
    fn into_api_error(self, upstream: &'static str) -> ApiError {
        match self {
            Self::Target(message) => {
                warn!(upstream, error = %message, "request cannot be rewritten");
                ApiError::new(StatusCode::BAD_REQUEST.as_u16(), "bad request target")
            }
            Self::Upstream(message) => {
                warn!(upstream, error = %message, "upstream unavailable");
                ApiError::new(
                    StatusCode::BAD_GATEWAY.as_u16(),
                    format!("{upstream} unavailable"),
                )
            }
        }
    }
}

fn is_hop_header(name: &str) -> bool {
    HOP_HEADERS
        .iter()
        .any(|hop| hop.eq_ignore_ascii_case(name))
}

/// Forward `/api/v1/{tail}` to the backend, keeping method, query and body.
pub async fn forward_api(
    req: HttpRequest,
    body: web::Bytes,
    proxy: web::Data<EdgeProxy>,
) -> ApiResult<HttpResponse> {
    proxy
        .forward(&proxy.server_url, &req, body)
        .await
        .map_err(|error| error.into_api_error("backend"))
}

/// Forward any other path to the page renderer, or answer 404 without one.
pub async fn forward_page(
    req: HttpRequest,
    body: web::Bytes,
    proxy: web::Data<EdgeProxy>,
) -> ApiResult<HttpResponse> {
    let Some(pages_url) = proxy.pages_url.as_ref() else {
        return Err(ApiError::new(StatusCode::NOT_FOUND.as_u16(), "not found"));
    };
    proxy
        .forward(pages_url, &req, body)
        .await
        .map_err(|error| error.into_api_error("page renderer"))
}
