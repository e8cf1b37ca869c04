//! Domain primitives and services for talking to the stocks backend.
//!
//! Purpose: keep request targets, failure values and cached query state
//! strongly typed so UI code never handles raw paths or untyped error bodies.
//!
//! Public surface:
//! - `ApiPath`: version-prefixed request target.
//! - `FetchError`: API, client and malformed-response failures.
//! - `FetchClient`: single HTTP call with default headers and error mapping.
//! - `QueryCache`: de-duplicating, revalidating cache keyed by `ApiPath`.
//! - `SessionAccessor`: session-check specialisation of the cache.
//! - `AuthApi`, `StocksApi`: typed wrappers over the backend contract.

pub mod api;
pub mod api_path;
pub mod credentials;
pub mod error;
pub mod fetch_client;
pub mod ports;
pub mod query;
pub mod session;
pub mod session_accessor;
pub mod stock;

pub use self::api::{AuthApi, StocksApi, stock_query, stocks_query};
pub use self::api_path::{API_VERSION_PREFIX, ApiPath};
pub use self::credentials::{Credentials, CredentialsValidationError, satisfies_password_policy};
pub use self::error::{ApiError, ClientError, FetchError};
pub use self::fetch_client::{FetchClient, RequestOptions};
pub use self::query::{
    BackoffJitter, NoJitter, QueryCache, QueryConfig, QueryHandle, QueryRuntime, QuerySnapshot,
    RandomJitter, RetryPolicy, RevalidationEvent, ViewState,
};
pub use self::session::{LogoutStatus, SESSION_PATH, SessionState, SessionUser};
pub use self::session_accessor::{SessionAccessor, SessionHandle, SessionSnapshot};
pub use self::stock::{Stock, StockId, StockIdError};
