//! HTTP adapters for the stocks backend.

mod reqwest_transport;

pub use reqwest_transport::ReqwestTransport;
