//! Per-key cache entry and its published state.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use futures_util::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::sync::watch;

use super::{QueryConfig, RetryPolicy, RevalidationEvent};
use crate::domain::{FetchError, RequestOptions};

pub(crate) type InFlight = Shared<BoxFuture<'static, Result<Value, FetchError>>>;

/// State published to subscribers of one key.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct EntryState {
    pub(crate) data: Option<Value>,
    pub(crate) error: Option<FetchError>,
    pub(crate) is_validating: bool,
    pub(crate) updated_at: Option<DateTime<Utc>>,
}

impl EntryState {
    /// Loading means a fetch is outstanding and nothing has settled yet.
    pub(crate) const fn is_loading(&self) -> bool {
        self.is_validating && self.data.is_none() && self.error.is_none()
    }
}

pub(crate) struct CacheEntry {
    state: watch::Sender<EntryState>,
    pub(crate) options: RequestOptions,
    retry: RetryPolicy,
    pub(crate) in_flight: Option<(u64, InFlight)>,
    pub(crate) stale: bool,
    failures: u32,
    retry_not_before: Option<DateTime<Utc>>,
    settled_at: Option<DateTime<Utc>>,
    subscriptions: Vec<Weak<QueryConfig>>,
}

impl CacheEntry {
    pub(crate) fn new(options: RequestOptions, retry: RetryPolicy) -> Self {
        let (state, _) = watch::channel(EntryState::default());
        Self {
            state,
            options,
            retry,
            in_flight: None,
            stale: true,
            failures: 0,
            retry_not_before: None,
            settled_at: None,
            subscriptions: Vec::new(),
        }
    }

    pub(crate) fn receiver(&self) -> watch::Receiver<EntryState> {
        self.state.subscribe()
    }

    /// Receiver whose sender is already gone, for subscriptions made after
    /// the cache shut down.
    pub(crate) fn closed_receiver() -> watch::Receiver<EntryState> {
        let (_, receiver) = watch::channel(EntryState::default());
        receiver
    }

    pub(crate) fn subscribe(&mut self, config: &Arc<QueryConfig>) {
        self.subscriptions.retain(|weak| weak.strong_count() > 0);
        self.subscriptions.push(Arc::downgrade(config));
    }

    pub(crate) fn mark_validating(&self) {
        self.state.send_modify(|state| state.is_validating = true);
    }

    pub(crate) const fn failures(&self) -> u32 {
        self.failures
    }

    pub(crate) const fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Result to hand out without fetching, if the entry is settled and fresh.
    pub(crate) fn cached_result(&self) -> Option<Result<Value, FetchError>> {
        if self.in_flight.is_some() || self.stale {
            return None;
        }
        self.latest_result()
    }

    /// Outcome of the last settled request, if any.
    pub(crate) fn latest_result(&self) -> Option<Result<Value, FetchError>> {
        let state = self.state.borrow();
        if let Some(error) = &state.error {
            return Some(Err(error.clone()));
        }
        state.data.clone().map(Ok)
    }

    /// Whether a newly mounted subscriber should start a fetch.
    pub(crate) fn mount_due(&self, config: &QueryConfig, now: DateTime<Utc>) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        if self.is_unsettled() {
            return true;
        }
        config.revalidate_on_mount && self.automatic_fetch_allowed(config.dedupe_interval, now)
    }

    /// Whether `event` should revalidate this entry now.
    pub(crate) fn event_due(&mut self, event: RevalidationEvent, now: DateTime<Utc>) -> bool {
        self.subscriptions.retain(|weak| weak.strong_count() > 0);
        if self.in_flight.is_some() {
            return false;
        }
        let interested = self
            .subscriptions
            .iter()
            .filter_map(Weak::upgrade)
            .find(|config| config.revalidates_on(event));
        interested.is_some_and(|config| {
            self.automatic_fetch_allowed(config.dedupe_interval, now)
        })
    }

    pub(crate) fn owns_fetch(&self, generation: u64) -> bool {
        matches!(&self.in_flight, Some((current, _)) if *current == generation)
    }

    pub(crate) fn record_success(&mut self, value: Value, now: DateTime<Utc>) {
        self.finish(now);
        self.failures = 0;
        self.retry_not_before = None;
        self.state.send_modify(|state| {
            state.data = Some(value);
            state.error = None;
            state.is_validating = false;
            state.updated_at = Some(now);
        });
    }

    /// Keep existing data, surface the error and push back automatic retries.
    pub(crate) fn record_failure(&mut self, error: FetchError, now: DateTime<Utc>, delay: Duration) {
        self.finish(now);
        self.failures = self.failures.saturating_add(1);
        self.retry_not_before = TimeDelta::from_std(delay)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta));
        self.state.send_modify(|state| {
            state.error = Some(error);
            state.is_validating = false;
        });
    }

    fn finish(&mut self, now: DateTime<Utc>) {
        self.in_flight = None;
        self.stale = false;
        self.settled_at = Some(now);
    }

    fn is_unsettled(&self) -> bool {
        let state = self.state.borrow();
        state.data.is_none() && state.error.is_none()
    }

    fn automatic_fetch_allowed(&self, dedupe_interval: Duration, now: DateTime<Utc>) -> bool {
        self.retry_allows(now) && !self.settled_within(dedupe_interval, now)
    }

    fn retry_allows(&self, now: DateTime<Utc>) -> bool {
        if self.failures == 0 {
            return true;
        }
        self.retry.allows_attempt(self.failures)
            && self.retry_not_before.is_none_or(|at| now >= at)
    }

    // A clock that went backwards counts as recent.
    fn settled_within(&self, interval: Duration, now: DateTime<Utc>) -> bool {
        self.settled_at.is_some_and(|at| {
            now.signed_duration_since(at)
                .to_std()
                .map_or(true, |elapsed| elapsed < interval)
        })
    }
}
