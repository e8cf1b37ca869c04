//! Tests for the edge server bootstrap and route wiring.

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::{StatusCode, header};
use actix_web::{test as actix_test, web};
use frontend::test_support::{FixtureSessionProbe, ProbeBehaviour};
use rstest::{fixture, rstest};
use url::Url;

use super::{AppDependencies, ServerConfig, build_app, create_server};
use frontend::domain::ports::SessionProbe;
use frontend::inbound::http::health::EdgeHealth;
use frontend::inbound::http::proxy::EdgeProxy;

#[fixture]
fn proxy() -> EdgeProxy {
    let unreachable = Url::parse("http://127.0.0.1:9").expect("valid url");
    EdgeProxy::new(unreachable, None, Duration::from_secs(1)).expect("client builds")
}

fn deps(proxy: EdgeProxy, probe: Arc<dyn SessionProbe>) -> AppDependencies {
    AppDependencies {
        health: web::Data::new(EdgeHealth::new()),
        proxy: web::Data::new(proxy),
        probe,
        client_url: Url::parse("https://stocks.example.com").ok(),
    }
}

#[rstest]
#[actix_web::test]
async fn create_server_marks_readiness(proxy: EdgeProxy) {
    let health = web::Data::new(EdgeHealth::new());
    let probe: Arc<dyn SessionProbe> = Arc::new(FixtureSessionProbe::new(ProbeBehaviour::Accept));
    let config = ServerConfig::new("127.0.0.1:0".parse().expect("valid addr"), proxy, probe);
    assert!(!health.is_ready(), "state should start unready");

    let _server = create_server(health.clone(), config).expect("server should bind");

    assert!(health.is_ready(), "server creation should mark readiness");
}

#[rstest]
#[actix_web::test]
async fn health_probes_are_routed(proxy: EdgeProxy) {
    let probe: Arc<dyn SessionProbe> = Arc::new(FixtureSessionProbe::new(ProbeBehaviour::Accept));
    let app = actix_test::init_service(build_app(deps(proxy, probe))).await;

    let live = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health/live").to_request()).await;
    let ready = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/health/ready").to_request()).await;

    assert_eq!(live.status(), StatusCode::OK);
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[rstest]
#[actix_web::test]
async fn signed_in_visitors_skip_the_login_page(proxy: EdgeProxy) {
    let probe = Arc::new(FixtureSessionProbe::new(ProbeBehaviour::Accept));
    let app = actix_test::init_service(build_app(deps(proxy, probe.clone()))).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/auth/login")
            .insert_header((header::COOKIE, "SSID=abc"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(probe.cookies(), vec!["SSID=abc".to_owned()]);
}

#[rstest]
#[actix_web::test]
async fn api_login_posts_are_proxied_not_guarded(proxy: EdgeProxy) {
    let probe = Arc::new(FixtureSessionProbe::new(ProbeBehaviour::Accept));
    let app = actix_test::init_service(build_app(deps(proxy, probe.clone()))).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/api/v1/auth/login").to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(probe.calls(), 0);
}

#[rstest]
#[actix_web::test]
async fn pages_without_a_renderer_are_not_found(proxy: EdgeProxy) {
    let probe: Arc<dyn SessionProbe> = Arc::new(FixtureSessionProbe::new(ProbeBehaviour::Accept));
    let app = actix_test::init_service(build_app(deps(proxy, probe))).await;

    let response = actix_test::call_service(&app, actix_test::TestRequest::get().uri("/stocks").to_request()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
