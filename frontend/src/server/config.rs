//! Edge server configuration object.

use std::net::SocketAddr;
use std::sync::Arc;

use frontend::domain::ports::SessionProbe;
use frontend::inbound::http::proxy::EdgeProxy;
use url::Url;

/// Builder-style configuration for creating the edge server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) proxy: EdgeProxy,
    pub(crate) probe: Arc<dyn SessionProbe>,
    pub(crate) client_url: Option<Url>,
}

impl ServerConfig {
    /// Configuration without a redirect destination.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, proxy: EdgeProxy, probe: Arc<dyn SessionProbe>) -> Self {
        Self {
            bind_addr,
            proxy,
            probe,
            client_url: None,
        }
    }

    /// Redirect signed-in visitors on the auth pages to the root of `client_url`.
    #[must_use]
    pub fn with_client_url(mut self, client_url: Option<Url>) -> Self {
        self.client_url = client_url;
        self
    }
}
