//! Edge server entry-point: redirect guard, API proxy and health probes.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use mockable::DefaultEnv;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use frontend::domain::ports::{HttpTransport, SessionProbe};
use frontend::inbound::http::edge_config::edge_settings_from_env;
use frontend::inbound::http::health::EdgeHealth;
use frontend::inbound::http::proxy::EdgeProxy;
use frontend::outbound::http::ReqwestTransport;
use frontend::FetchClient;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = edge_settings_from_env(&DefaultEnv::new()).map_err(io::Error::other)?;

    let transport: Arc<dyn HttpTransport> = Arc::new(
        ReqwestTransport::new(settings.server_url.clone(), settings.request_timeout)
            .map_err(io::Error::other)?,
    );
    let probe: Arc<dyn SessionProbe> = Arc::new(FetchClient::new(transport));
    let proxy = EdgeProxy::new(
        settings.server_url,
        settings.pages_url,
        settings.request_timeout,
    )
    .map_err(io::Error::other)?;

    let config =
        ServerConfig::new(settings.bind_addr, proxy, probe).with_client_url(settings.client_url);
    let health = web::Data::new(EdgeHealth::new());
    create_server(health, config)?.await
}
