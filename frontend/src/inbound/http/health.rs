//! Readiness and liveness probes for the edge server.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, http::header, web};

/// Probe flags shared between the server bootstrap and the probe handlers.
///
/// The edge starts live but not ready; the server bootstrap flips readiness
/// once the listener is bound.
pub struct EdgeHealth {
    ready: AtomicBool,
    draining: AtomicBool,
}

impl Default for EdgeHealth {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            draining: AtomicBool::new(false),
        }
    }
}

impl EdgeHealth {
    /// Fresh state: live, not ready.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start accepting traffic.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail both probes so orchestrators stop routing here during shutdown.
    pub fn mark_draining(&self) {
        self.draining.store(true, Ordering::Release);
    }

    /// Ready and not draining.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire) && !self.is_draining()
    }

    /// Live until draining begins.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.is_draining()
    }

    fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }
}

fn probe_response(ok: bool) -> HttpResponse {
    let mut response = if ok {
        HttpResponse::Ok()
    } else {
        HttpResponse::ServiceUnavailable()
    };
    response
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish()
}

/// `GET /health/ready`: 200 once the edge can serve pages, 503 otherwise.
#[get("/health/ready")]
pub async fn ready(state: web::Data<EdgeHealth>) -> HttpResponse {
    probe_response(state.is_ready())
}

/// `GET /health/live`: 200 until draining starts.
#[get("/health/live")]
pub async fn live(state: web::Data<EdgeHealth>) -> HttpResponse {
    probe_response(state.is_alive())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    async fn probe(state: web::Data<EdgeHealth>, uri: &str) -> (StatusCode, Option<String>) {
        let app = actix_test::init_service(App::new().app_data(state).service(ready).service(live)).await;
        let response = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
        let cache_control = response
            .headers()
            .get(header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        (response.status(), cache_control)
    }

    #[rstest]
    #[case::ready_before_bind("/health/ready", false, false, StatusCode::SERVICE_UNAVAILABLE)]
    #[case::ready_after_bind("/health/ready", true, false, StatusCode::OK)]
    #[case::ready_while_draining("/health/ready", true, true, StatusCode::SERVICE_UNAVAILABLE)]
    #[case::live_by_default("/health/live", false, false, StatusCode::OK)]
    #[case::live_while_draining("/health/live", true, true, StatusCode::SERVICE_UNAVAILABLE)]
    #[actix_web::test]
    async fn probes_follow_state(
        #[case] uri: &str,
        #[case] bound: bool,
        #[case] draining: bool,
        #[case] expected: StatusCode,
    ) {
        let state = web::Data::new(EdgeHealth::new());
        if bound {
            state.mark_ready();
        }
        if draining {
            state.mark_draining();
        }

        let (status, cache_control) = probe(state, uri).await;

        assert_eq!(status, expected);
        assert_eq!(cache_control.as_deref(), Some("no-store"));
    }
}
