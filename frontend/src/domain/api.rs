//! Typed wrappers over the backend's auth and stock endpoints.

use crate::domain::query::{QueryCache, QueryConfig, QueryHandle};
use crate::domain::{
    ClientError, Credentials, FetchClient, FetchError, LogoutStatus, RequestOptions, SessionUser,
    Stock, StockId,
};

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const LOGOUT_PATH: &str = "/auth/logout";
const STOCKS_PATH: &str = "/stocks";

/// Login, registration and logout calls.
#[derive(Clone)]
pub struct AuthApi {
    client: FetchClient,
}

impl AuthApi {
    /// Wrap a fetch client.
    pub const fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// `POST /auth/login`.
    ///
    /// # Errors
    /// Returns [`ClientError::Validation`] without sending a request when a
    /// field is empty, otherwise the [`FetchError`] of the call.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, FetchError> {
        let credentials = Credentials::for_login(email, password).map_err(ClientError::from)?;
        self.submit(LOGIN_PATH, &credentials).await
    }

    /// `POST /auth/register`.
    ///
    /// # Errors
    /// Returns [`ClientError::Validation`] without sending a request when a
    /// field is empty or the password fails the policy, otherwise the
    /// [`FetchError`] of the call.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionUser, FetchError> {
        let credentials =
            Credentials::for_registration(email, password).map_err(ClientError::from)?;
        self.submit(REGISTER_PATH, &credentials).await
    }

    /// `POST /auth/logout`.
    ///
    /// # Errors
    /// Returns the [`FetchError`] of the call.
    pub async fn logout(&self) -> Result<LogoutStatus, FetchError> {
        self.client.fetch(LOGOUT_PATH, RequestOptions::post()).await
    }

    async fn submit(
        &self,
        path: &'static str,
        credentials: &Credentials,
    ) -> Result<SessionUser, FetchError> {
        let options = RequestOptions::post_json(credentials)?;
        self.client.fetch(path, options).await
    }
}

/// Stock listing and detail calls.
#[derive(Clone)]
pub struct StocksApi {
    client: FetchClient,
}

impl StocksApi {
    /// Wrap a fetch client.
    pub const fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// `GET /stocks`.
    ///
    /// # Errors
    /// Returns the [`FetchError`] of the call.
    pub async fn list(&self) -> Result<Vec<Stock>, FetchError> {
        self.client.fetch(STOCKS_PATH, RequestOptions::get()).await
    }

    /// `GET /stocks/{id}`.
    ///
    /// # Errors
    /// Returns the [`FetchError`] of the call; a missing stock is an
    /// [`crate::domain::ApiError`] with status 404.
    pub async fn get(&self, id: StockId) -> Result<Stock, FetchError> {
        self.client.fetch(id.path(), RequestOptions::get()).await
    }
}

/// Cached subscription backing the stock listing view.
#[must_use]
pub fn stocks_query(cache: &QueryCache, config: QueryConfig) -> QueryHandle<Vec<Stock>> {
    cache.query(STOCKS_PATH, RequestOptions::get(), config)
}

/// Cached subscription backing the stock detail view.
#[must_use]
pub fn stock_query(cache: &QueryCache, id: StockId, config: QueryConfig) -> QueryHandle<Stock> {
    cache.query(id.path(), RequestOptions::get(), config)
}
