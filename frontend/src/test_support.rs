//! Shared test doubles for unit and integration tests.

use std::collections::VecDeque;
use std::panic::panic_any;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use serde_json::Value;
use tokio::sync::Semaphore;

use crate::domain::FetchError;
use crate::domain::ports::{ApiRequest, ApiResponse, HttpTransport, SessionProbe, TransportError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock whose time only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward.
    ///
    /// # Panics
    /// Panics when `delta` does not fit a [`TimeDelta`].
    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *lock(&self.0) += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0)
    }
}

/// Scripted [`HttpTransport`] that records requests and replays queued
/// responses in order.
///
/// A gated transport holds every response until permits are released
/// through the semaphore returned by [`StubTransport::gated`].
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
    gate: Option<Arc<Semaphore>>,
}

impl StubTransport {
    /// Transport answering immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that waits for a semaphore permit before each answer.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (transport, gate)
    }

    /// Queue a JSON response.
    pub fn push_json(&self, status: u16, body: Value) {
        lock(&self.responses).push_back(Ok(ApiResponse::json(status, &body)));
    }

    /// Queue a raw response body.
    pub fn push_raw(&self, status: u16, body: impl Into<Vec<u8>>) {
        lock(&self.responses).push_back(Ok(ApiResponse {
            status,
            body: body.into(),
        }));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: TransportError) {
        lock(&self.responses).push_back(Err(error));
    }

    /// Number of requests sent so far.
    pub fn calls(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Responses still queued.
    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }

    /// Requests sent so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl HttpTransport for StubTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        lock(&self.requests).push(request);
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::connect("no stubbed response")))
    }
}

/// Behaviour of a [`FixtureSessionProbe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeBehaviour {
    /// Accept every cookie jar.
    Accept,
    /// Reject with the given error.
    Reject(FetchError),
    /// Panic inside the probe.
    Panic,
}

/// Session probe with a fixed answer that records forwarded cookie headers.
pub struct FixtureSessionProbe {
    behaviour: ProbeBehaviour,
    cookies: Mutex<Vec<String>>,
}

impl FixtureSessionProbe {
    /// Probe with the given behaviour.
    pub fn new(behaviour: ProbeBehaviour) -> Self {
        Self {
            behaviour,
            cookies: Mutex::new(Vec::new()),
        }
    }

    /// Cookie headers received, in call order.
    pub fn cookies(&self) -> Vec<String> {
        lock(&self.cookies).clone()
    }

    /// Number of session checks performed.
    pub fn calls(&self) -> usize {
        lock(&self.cookies).len()
    }
}

#[async_trait]
impl SessionProbe for FixtureSessionProbe {
    async fn check_session(&self, cookie_header: &str) -> Result<(), FetchError> {
        lock(&self.cookies).push(cookie_header.to_owned());
        match &self.behaviour {
            ProbeBehaviour::Accept => Ok(()),
            ProbeBehaviour::Reject(error) => Err(error.clone()),
            ProbeBehaviour::Panic => panic_any("session probe exploded"),
        }
    }
}
