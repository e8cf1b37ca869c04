//! Inbound adapters that sit between browsers and the page renderer.
//!
//! Everything under [`http`] is actix-web specific; the domain layer never
//! sees a request or response type from the framework.

pub mod http;
