//! Data-fetching and session layer for the stock-trading front-end.
//!
//! The domain module owns the request normalizer, fetch client, query cache
//! and session accessor. Inbound adapters expose the edge redirect guard and
//! API proxy to actix-web; outbound adapters speak HTTP to the backend.

pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::{ApiError, ApiPath, ClientError, FetchClient, FetchError, QueryCache};
pub use inbound::http::redirect_guard::RedirectGuard;
