//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use tracing::info;
use url::Url;

use frontend::RedirectGuard;
use frontend::domain::ports::SessionProbe;
use frontend::inbound::http::health::{EdgeHealth, live, ready};
use frontend::inbound::http::proxy::{API_ROUTE, EdgeProxy, forward_api, forward_page};
use frontend::inbound::http::request_span::RequestSpan;

#[derive(Clone)]
struct AppDependencies {
    health: web::Data<EdgeHealth>,
    proxy: web::Data<EdgeProxy>,
    probe: Arc<dyn SessionProbe>,
    client_url: Option<Url>,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health,
        proxy,
        probe,
        client_url,
    } = deps;

    // The guard only acts on GET /auth/login and /auth/register; API paths
    // live under /api/v1 and never match.
    App::new()
        .app_data(health)
        .app_data(proxy)
        .wrap(RedirectGuard::new(probe, client_url))
        .wrap(RequestSpan)
        .service(ready)
        .service(live)
        .route(API_ROUTE, web::to(forward_api))
        .default_service(web::to(forward_page))
}

/// Construct the edge server.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(health: web::Data<EdgeHealth>, config: ServerConfig) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        proxy,
        probe,
        client_url,
    } = config;
    let deps = AppDependencies {
        health: health.clone(),
        proxy: web::Data::new(proxy),
        probe,
        client_url,
    };

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();

    info!(%bind_addr, "edge server listening");
    health.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests;
