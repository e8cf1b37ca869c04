//! Edge redirect guard.
//!
//! Visitors who already hold a valid session have no business on the login
//! or registration pages. Before those pages render, the guard forwards the
//! visitor's cookie jar to the backend session check and, when the backend
//! accepts it, answers `307 Temporary Redirect` to the client root.
//!
//! The guard fails open: a missing client URL, an unreachable backend or a
//! panicking probe all let the request continue to the page renderer.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{Method, header};
use actix_web::{Error, HttpResponse};
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, warn};
use url::Url;

use crate::domain::FetchError;
use crate::domain::ports::{SessionProbe, define_port_error};
use crate::inbound::http::cookie_jar::format_cookie_jar;

/// Page paths that redirect authenticated visitors.
pub const GUARDED_PATHS: [&str; 2] = ["/auth/login", "/auth/register"];

define_port_error! {
    /// Why the guard could not decide on a redirect.
    pub enum GuardError {
        /// `CLIENT_URL` is not configured.
        MissingClientUrl => "client base URL is not configured",
        /// The client URL cannot be resolved to its root.
        InvalidClientUrl { message: String } => "client base URL is unusable: {message}",
        /// The `Cookie` header could not be parsed.
        CookieParse { message: String } => "cookie header is unreadable: {message}",
        /// The backend could not be asked, or answered with something other
        /// than a rejection.
        SessionCheck { error: FetchError } => "session check failed: {error}",
        /// The probe panicked.
        ProbePanicked { message: String } => "session probe panicked: {message}",
    }
}

/// Decision for one guarded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The visitor is signed in; send them here.
    Redirect(Url),
    /// The visitor is anonymous; render the page.
    PassThrough,
    /// No decision could be made; render the page and log the reason.
    Failed(GuardError),
}

/// Whether `method` and `path` select a guarded page.
///
/// Only `GET` is guarded so form posts always reach their handler. A single
/// trailing slash is ignored.
#[must_use]
pub fn is_guarded(method: &Method, path: &str) -> bool {
    if *method != Method::GET {
        return false;
    }
    let path = path.strip_suffix('/').unwrap_or(path);
    GUARDED_PATHS.contains(&path)
}

/// Ask `probe` whether `cookie_header` is a live session.
///
/// The client URL is checked first so an unconfigured edge never calls the
/// backend. A backend rejection is the ordinary anonymous case and passes
/// through quietly; every other failure, including a panic inside the probe,
/// is reported as [`GuardOutcome::Failed`].
pub async fn evaluate(
    probe: &dyn SessionProbe,
    client_url: Option<&Url>,
    cookie_header: &str,
) -> GuardOutcome {
    let Some(client_url) = client_url else {
        return GuardOutcome::Failed(GuardError::missing_client_url());
    };
    let root = match client_url.join("/") {
        Ok(root) => root,
        Err(error) => {
            return GuardOutcome::Failed(GuardError::invalid_client_url(error.to_string()));
        }
    };

    let check = async { probe.check_session(cookie_header).await };
    match AssertUnwindSafe(check).catch_unwind().await {
        Ok(Ok(())) => GuardOutcome::Redirect(root),
        Ok(Err(FetchError::Api(rejection))) => {
            debug!(status = rejection.status(), "no live session; rendering page");
            GuardOutcome::PassThrough
        }
        Ok(Err(error)) => GuardOutcome::Failed(GuardError::session_check(error)),
        Err(payload) => GuardOutcome::Failed(GuardError::probe_panicked(panic_message(&*payload))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

fn cookie_header(req: &ServiceRequest) -> Result<String, GuardError> {
    let cookies = req
        .cookies()
        .map_err(|error| GuardError::cookie_parse(error.to_string()))?;
    Ok(format_cookie_jar(&cookies))
}

/// Middleware redirecting signed-in visitors away from the auth pages.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use actix_web::App;
/// use frontend::RedirectGuard;
/// use frontend::test_support::{FixtureSessionProbe, ProbeBehaviour};
///
/// let probe = Arc::new(FixtureSessionProbe::new(ProbeBehaviour::Accept));
/// let client_url = url::Url::parse("https://stocks.example.com").ok();
/// let _app = App::new().wrap(RedirectGuard::new(probe, client_url));
/// ```
#[derive(Clone)]
pub struct RedirectGuard {
    probe: Arc<dyn SessionProbe>,
    client_url: Option<Url>,
}

impl RedirectGuard {
    /// Guard backed by `probe`, redirecting to the root of `client_url`.
    pub fn new(probe: Arc<dyn SessionProbe>, client_url: Option<Url>) -> Self {
        Self { probe, client_url }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RedirectGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RedirectGuardMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RedirectGuardMiddleware {
            service: Rc::new(service),
            probe: Arc::clone(&self.probe),
            client_url: self.client_url.clone(),
        }))
    }
}

/// Service wrapper produced by [`RedirectGuard`].
pub struct RedirectGuardMiddleware<S> {
    service: Rc<S>,
    probe: Arc<dyn SessionProbe>,
    client_url: Option<Url>,
}

impl<S, B> Service<ServiceRequest> for RedirectGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !is_guarded(req.method(), req.path()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        let service = Rc::clone(&self.service);
        let probe = Arc::clone(&self.probe);
        let client_url = self.client_url.clone();
        Box::pin(async move {
            let outcome = match cookie_header(&req) {
                Ok(jar) => evaluate(probe.as_ref(), client_url.as_ref(), &jar).await,
                Err(error) => GuardOutcome::Failed(error),
            };
            match outcome {
                GuardOutcome::Redirect(location) => {
                    debug!(path = req.path(), location = %location, "redirecting signed-in visitor");
                    let response = HttpResponse::TemporaryRedirect()
                        .insert_header((header::LOCATION, location.as_str()))
                        .finish();
                    Ok(req.into_response(response).map_into_right_body())
                }
                GuardOutcome::PassThrough => {
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
                GuardOutcome::Failed(error) => {
                    warn!(path = req.path(), error = %error, "redirect guard failed; rendering page");
                    service.call(req).await.map(ServiceResponse::map_into_left_body)
                }
            }
        })
    }
}
