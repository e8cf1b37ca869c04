//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod http_transport;
mod session_probe;

#[cfg(test)]
pub use http_transport::MockHttpTransport;
pub use http_transport::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, RequestHeaders, TransportError,
};
#[cfg(test)]
pub use session_probe::MockSessionProbe;
pub use session_probe::SessionProbe;
