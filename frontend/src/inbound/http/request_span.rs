//! Request span middleware.
//!
//! Every request handled by the edge runs inside an `edge_request` span
//! carrying its method and path, so guard decisions and proxy failures logged
//! further down are attributable to the request that caused them.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, debug, info_span};

/// Middleware wrapping each request in an `info` span.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use frontend::inbound::http::request_span::RequestSpan;
///
/// let _app = App::new().wrap(RequestSpan);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestSpan;

impl<S, B> Transform<S, ServiceRequest> for RequestSpan
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestSpanMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestSpanMiddleware { service }))
    }
}

/// Service wrapper produced by [`RequestSpan`].
pub struct RequestSpanMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestSpanMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let span = info_span!(
            "edge_request",
            method = %req.method(),
            path = %req.path(),
        );
        let fut = {
            let _entered = span.enter();
            self.service.call(req)
        };
        Box::pin(
            async move {
                let res = fut.await?;
                debug!(status = res.status().as_u16(), "request finished");
                Ok(res)
            }
            .instrument(span),
        )
    }
}
