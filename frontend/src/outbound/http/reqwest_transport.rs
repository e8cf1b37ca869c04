//! Reqwest-backed transport to the stocks backend.
//!
//! This adapter owns transport details only: resolving targets against the
//! backend origin, applying the request timeout and mapping reqwest failures.
//! Status handling and JSON decoding live in the fetch client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url};

use crate::domain::ports::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, TransportError};

const DEFAULT_USER_AGENT: &str = "stocked-frontend/0.1";

/// Transport that sends every request to one backend origin.
pub struct ReqwestTransport {
    client: Client,
    origin: Url,
}

impl ReqwestTransport {
    /// Build a transport with an explicit request timeout.
    ///
    /// `origin` should have no path: targets are absolute `/api/v1/...`
    /// paths and replace whatever path `origin` carries.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(origin: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self { client, origin })
    }

    /// Backend origin requests are resolved against.
    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn resolve(&self, request: &ApiRequest) -> Result<Url, TransportError> {
        self.origin
            .join(request.target.as_str())
            .map_err(|err| TransportError::invalid_target(format!("{}: {err}", request.target)))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.resolve(&request)?;
        let mut builder = self.client.request(method_for(request.method), url);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_transport_error)?;
        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn method_for(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::timeout(error.to_string())
    } else {
        TransportError::connect(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the reqwest transport against a mock server.

    use super::*;
    use crate::domain::ApiPath;
    use crate::domain::ports::RequestHeaders;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transport(server: &MockServer, timeout: Duration) -> ReqwestTransport {
        let origin = Url::parse(&server.uri()).expect("mock server uri");
        ReqwestTransport::new(origin, timeout).expect("client builds")
    }

    fn get(target: &str) -> ApiRequest {
        ApiRequest {
            method: HttpMethod::Get,
            target: ApiPath::normalize(target),
            headers: RequestHeaders::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn forwards_method_headers_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .and(header("content-type", "application/json"))
            .and(header("cookie", "SSID=abc"))
            .and(body_json(json!({"email": "ada@example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;
        let request = ApiRequest {
            method: HttpMethod::Post,
            target: ApiPath::normalize("auth/login"),
            headers: RequestHeaders::new()
                .with("content-type", "application/json")
                .with("cookie", "SSID=abc"),
            body: Some(br#"{"email":"ada@example.com"}"#.to_vec()),
        };

        let response = transport(&server, Duration::from_secs(5))
            .send(request)
            .await
            .expect("request succeeds");

        assert_eq!(response.status, 200);
        let body: serde_json::Value = serde_json::from_slice(&response.body).expect("json body");
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn returns_failure_statuses_without_interpreting_them() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/stocks/999"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "not found", "status": 404})),
            )
            .mount(&server)
            .await;

        let response = transport(&server, Duration::from_secs(5))
            .send(get("/stocks/999"))
            .await
            .expect("404 is still a response");

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
    }

    #[tokio::test]
    async fn keeps_query_strings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/stocks"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server, Duration::from_secs(5))
            .send(get("stocks?page=2"))
            .await
            .expect("request succeeds");

        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn slow_responses_map_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let error = transport(&server, Duration::from_millis(50))
            .send(get("stocks"))
            .await
            .expect_err("request times out");

        assert!(matches!(error, TransportError::Timeout { .. }));
    }

    #[tokio::test]
    async fn unreachable_origin_maps_to_connect() {
        let origin = Url::parse("http://127.0.0.1:9").expect("valid url");
        let transport =
            ReqwestTransport::new(origin, Duration::from_secs(2)).expect("client builds");

        let error = transport
            .send(get("stocks"))
            .await
            .expect_err("nothing listens on the discard port");

        assert!(matches!(
            error,
            TransportError::Connect { .. } | TransportError::Timeout { .. }
        ));
    }

    #[test]
    fn maps_every_method() {
        assert_eq!(method_for(HttpMethod::Get), Method::GET);
        assert_eq!(method_for(HttpMethod::Delete), Method::DELETE);
        assert_eq!(method_for(HttpMethod::Patch), Method::PATCH);
    }
}
