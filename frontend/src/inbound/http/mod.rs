//! HTTP inbound adapter for the edge server.

pub mod cookie_jar;
pub mod edge_config;
pub mod error;
pub mod health;
pub mod proxy;
pub mod redirect_guard;
pub mod request_span;

pub use error::ApiResult;
