//! Behaviour tests for the edge redirect guard.
//!
//! These scenarios drive the guard middleware through an actix test service
//! with a fixture session probe, covering the redirect, the anonymous case
//! and every fail-open path.

use std::cell::RefCell;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::{Method, header};
use actix_web::{App, HttpResponse, test as actix_test, web};
use frontend::domain::{ApiError, ClientError, FetchError};
use frontend::test_support::{FixtureSessionProbe, ProbeBehaviour};
use frontend::RedirectGuard;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use url::Url;

const PAGE: &str = "rendered page";

struct Exchange {
    status: u16,
    location: Option<String>,
    body: String,
}

struct GuardWorld {
    client_url: RefCell<Option<Url>>,
    behaviour: RefCell<ProbeBehaviour>,
    cookies: RefCell<Vec<(String, String)>>,
    probe: RefCell<Option<Arc<FixtureSessionProbe>>>,
    exchange: RefCell<Option<Exchange>>,
}

impl GuardWorld {
    fn new() -> Self {
        Self {
            client_url: RefCell::new(None),
            behaviour: RefCell::new(ProbeBehaviour::Accept),
            cookies: RefCell::new(Vec::new()),
            probe: RefCell::new(None),
            exchange: RefCell::new(None),
        }
    }

    fn send(&self, method: Method, path: &str) {
        let probe = Arc::new(FixtureSessionProbe::new(self.behaviour.borrow().clone()));
        let client_url = self.client_url.borrow().clone();
        let mut request = actix_test::TestRequest::default().method(method).uri(path);
        for (name, value) in self.cookies.borrow().iter() {
            request = request.cookie(Cookie::new(name.clone(), value.clone()));
        }

        let guard = RedirectGuard::new(probe.clone(), client_url);
        let exchange = actix_rt::System::new().block_on(async move {
            let app = actix_test::init_service(
                App::new()
                    .wrap(guard)
                    .default_service(web::to(|| async { HttpResponse::Ok().body(PAGE) })),
            )
            .await;
            let response = actix_test::call_service(&app, request.to_request()).await;
            let status = response.status().as_u16();
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let body = actix_test::read_body(response).await;
            Exchange {
                status,
                location,
                body: String::from_utf8_lossy(&body).into_owned(),
            }
        });

        *self.probe.borrow_mut() = Some(probe);
        *self.exchange.borrow_mut() = Some(exchange);
    }

    fn with_exchange<F>(&self, f: F)
    where
        F: FnOnce(&Exchange),
    {
        let exchange = self.exchange.borrow();
        f(exchange.as_ref().expect("request sent"));
    }

    fn probe(&self) -> Arc<FixtureSessionProbe> {
        self.probe.borrow().clone().expect("request sent")
    }
}

#[fixture]
fn world() -> GuardWorld {
    GuardWorld::new()
}

#[given("the client base URL is {url}")]
fn the_client_base_url_is(world: &GuardWorld, url: String) {
    *world.client_url.borrow_mut() = Some(Url::parse(&url).expect("valid client url"));
}

#[given("no client base URL is configured")]
fn no_client_base_url(world: &GuardWorld) {
    *world.client_url.borrow_mut() = None;
}

#[given("the backend accepts the session")]
fn the_backend_accepts(world: &GuardWorld) {
    *world.behaviour.borrow_mut() = ProbeBehaviour::Accept;
}

#[given("the backend rejects the session with status {status}")]
fn the_backend_rejects(world: &GuardWorld, status: u16) {
    *world.behaviour.borrow_mut() =
        ProbeBehaviour::Reject(FetchError::Api(ApiError::new(status, "Unauthorized")));
}

#[given("the backend is unreachable")]
fn the_backend_is_unreachable(world: &GuardWorld) {
    *world.behaviour.borrow_mut() = ProbeBehaviour::Reject(FetchError::Client(
        ClientError::transport("connection refused"),
    ));
}

#[given("the session probe panics")]
fn the_session_probe_panics(world: &GuardWorld) {
    *world.behaviour.borrow_mut() = ProbeBehaviour::Panic;
}

#[given("the visitor holds a cookie named {name} with value {value}")]
fn the_visitor_holds_a_cookie(world: &GuardWorld, name: String, value: String) {
    world.cookies.borrow_mut().push((name, value));
}

#[when("the visitor sends a {method} request to {path}")]
fn the_visitor_sends(world: &GuardWorld, method: String, path: String) {
    let method = Method::from_bytes(method.as_bytes()).expect("valid method");
    world.send(method, &path);
}

#[then("the response redirects to {location}")]
fn the_response_redirects(world: &GuardWorld, location: String) {
    world.with_exchange(|exchange| {
        assert_eq!(exchange.status, 307);
        assert_eq!(exchange.location.as_deref(), Some(location.as_str()));
    });
}

#[then("the page is rendered")]
fn the_page_is_rendered(world: &GuardWorld) {
    world.with_exchange(|exchange| {
        assert_eq!(exchange.status, 200);
        assert_eq!(exchange.location, None);
        assert_eq!(exchange.body, PAGE);
    });
}

#[then("the forwarded cookie header is \"{header}\"")]
fn the_forwarded_cookie_header_is(world: &GuardWorld, header: String) {
    assert_eq!(world.probe().cookies(), vec![header]);
}

#[then("the session check ran {count} times")]
fn the_session_check_ran(world: &GuardWorld, count: usize) {
    assert_eq!(world.probe().calls(), count);
}

#[scenario(
    path = "tests/features/redirect_guard.feature",
    name = "A signed-in visitor opening the login page is sent to the client root"
)]
fn signed_in_visitor_is_redirected(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/redirect_guard.feature",
    name = "An anonymous visitor sees the registration page"
)]
fn anonymous_visitor_sees_the_page(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/redirect_guard.feature",
    name = "An unreachable backend lets the page render"
)]
fn unreachable_backend_fails_open(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/redirect_guard.feature",
    name = "A panicking session check lets the page render"
)]
fn panicking_probe_fails_open(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/redirect_guard.feature",
    name = "Form submissions are never intercepted"
)]
fn form_submissions_are_not_intercepted(world: GuardWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/redirect_guard.feature",
    name = "Without a client base URL the backend is never asked"
)]
fn missing_client_url_skips_the_probe(world: GuardWorld) {
    drop(world);
}
