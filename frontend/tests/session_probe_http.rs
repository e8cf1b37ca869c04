//! End-to-end coverage for the production session probe: the fetch client
//! over the reqwest transport, talking to a mock backend.

use std::sync::Arc;
use std::time::Duration;

use frontend::domain::ports::{HttpTransport, SessionProbe};
use frontend::domain::{ApiError, FetchClient, FetchError};
use frontend::outbound::http::ReqwestTransport;
use rstest::{fixture, rstest};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[fixture]
fn timeout() -> Duration {
    Duration::from_secs(2)
}

fn client_for(server: &MockServer, timeout: Duration) -> FetchClient {
    let origin = Url::parse(&server.uri()).expect("mock server uri");
    let transport: Arc<dyn HttpTransport> =
        Arc::new(ReqwestTransport::new(origin, timeout).expect("client builds"));
    FetchClient::new(transport)
}

#[rstest]
#[tokio::test]
async fn accepted_jar_is_a_live_session(timeout: Duration) {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/session"))
        .and(header("cookie", "SSID=abc; theme=dark"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Ada",
            "balance": "$10.00",
            "email": "ada@example.com"
        })))
        .expect(1)
        .mount(&backend)
        .await;

    let result = client_for(&backend, timeout)
        .check_session("SSID=abc; theme=dark")
        .await;

    assert_eq!(result, Ok(()));
}

#[rstest]
#[tokio::test]
async fn rejected_jar_is_an_api_error(timeout: Duration) {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/session"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized", "status": 401})),
        )
        .mount(&backend)
        .await;

    let result = client_for(&backend, timeout).check_session("").await;

    assert_eq!(
        result,
        Err(FetchError::Api(ApiError::new(401, "Unauthorized")))
    );
}

#[rstest]
#[tokio::test]
async fn html_failure_pages_are_malformed_responses(timeout: Duration) {
    let backend = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&backend)
        .await;

    let result = client_for(&backend, timeout).check_session("SSID=abc").await;

    assert!(matches!(
        result,
        Err(FetchError::MalformedErrorResponse { status: 502, .. })
    ));
}
