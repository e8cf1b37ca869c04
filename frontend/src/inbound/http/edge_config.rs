//! Edge server settings read from the environment.
//!
//! Parsing is generic over [`mockable::Env`] so every branch can be exercised
//! without touching the process environment.

use std::net::SocketAddr;
use std::time::Duration;

use mockable::Env;
use tracing::warn;
use url::Url;

/// Client-facing base URL used as the redirect destination.
pub const CLIENT_URL_ENV: &str = "CLIENT_URL";
/// Backend origin for API calls and the proxy. Must not carry a path.
pub const SERVER_URL_ENV: &str = "SERVER_URL";
/// Upstream page renderer origin. Must not carry a path.
pub const PAGES_URL_ENV: &str = "PAGES_URL";
/// Socket address the edge listens on.
pub const BIND_ADDR_ENV: &str = "EDGE_BIND_ADDR";
/// Outbound request timeout in whole seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "EDGE_REQUEST_TIMEOUT_SECS";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const URL_EXPECTED: &str = "an absolute http(s) URL";
const ORIGIN_EXPECTED: &str = "an http(s) origin without a path, such as http://backend:8080";
const BIND_EXPECTED: &str = "a socket address such as 0.0.0.0:3000";
const TIMEOUT_EXPECTED: &str = "a positive number of seconds";

/// Validated edge settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSettings {
    /// Redirect destination for already-authenticated visitors.
    pub client_url: Option<Url>,
    /// Backend origin.
    pub server_url: Url,
    /// Page renderer origin; unset means non-API paths answer 404.
    pub pages_url: Option<Url>,
    /// Listener address.
    pub bind_addr: SocketAddr,
    /// Timeout applied to every outbound request.
    pub request_timeout: Duration,
}

/// Errors raised while reading edge settings.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EdgeConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Read edge settings from `env`.
///
/// # Errors
/// [`EdgeConfigError::MissingEnv`] when `SERVER_URL` is unset and
/// [`EdgeConfigError::InvalidEnv`] for any value that fails to parse.
pub fn edge_settings_from_env<E: Env>(env: &E) -> Result<EdgeSettings, EdgeConfigError> {
    let server_url = read(env, SERVER_URL_ENV)
        .ok_or(EdgeConfigError::MissingEnv {
            name: SERVER_URL_ENV,
        })
        .and_then(|value| parse_origin(SERVER_URL_ENV, value))?;
    let client_url = read(env, CLIENT_URL_ENV)
        .map(|value| parse_url(CLIENT_URL_ENV, value))
        .transpose()?;
    if client_url.is_none() {
        warn!("CLIENT_URL not set; authenticated visitors will not be redirected");
    }
    let pages_url = read(env, PAGES_URL_ENV)
        .map(|value| parse_origin(PAGES_URL_ENV, value))
        .transpose()?;

    Ok(EdgeSettings {
        client_url,
        server_url,
        pages_url,
        bind_addr: bind_addr_from_env(env)?,
        request_timeout: request_timeout_from_env(env)?,
    })
}

fn read<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_url(name: &'static str, value: String) -> Result<Url, EdgeConfigError> {
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(EdgeConfigError::InvalidEnv {
            name,
            value,
            expected: URL_EXPECTED,
        }),
    }
}

// Upstream requests join absolute paths, which replace any base path.
fn parse_origin(name: &'static str, value: String) -> Result<Url, EdgeConfigError> {
    let url = parse_url(name, value)?;
    if url.path() == "/" && url.query().is_none() && url.fragment().is_none() {
        return Ok(url);
    }
    Err(EdgeConfigError::InvalidEnv {
        name,
        value: url.into(),
        expected: ORIGIN_EXPECTED,
    })
}

fn bind_addr_from_env<E: Env>(env: &E) -> Result<SocketAddr, EdgeConfigError> {
    let value = read(env, BIND_ADDR_ENV).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
    value.parse().map_err(|_| EdgeConfigError::InvalidEnv {
        name: BIND_ADDR_ENV,
        value,
        expected: BIND_EXPECTED,
    })
}

fn request_timeout_from_env<E: Env>(env: &E) -> Result<Duration, EdgeConfigError> {
    let Some(value) = read(env, REQUEST_TIMEOUT_ENV) else {
        return Ok(DEFAULT_REQUEST_TIMEOUT);
    };
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(EdgeConfigError::InvalidEnv {
            name: REQUEST_TIMEOUT_ENV,
            value,
            expected: TIMEOUT_EXPECTED,
        }),
    }
}
