//! Subscriber-facing view of a cached query.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::debug;

use super::entry::EntryState;
use super::{QueryCache, QueryConfig};
use crate::domain::fetch_client::decode_value;
use crate::domain::{ApiPath, FetchError};

/// Typed point-in-time view of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<D> {
    /// Last successfully fetched data, kept across later failures.
    pub data: Option<D>,
    /// Error from the most recent settled fetch, if it failed.
    pub error: Option<FetchError>,
    /// No result yet and a fetch is outstanding.
    pub is_loading: bool,
    /// A fetch is outstanding, whether or not data is present.
    pub is_validating: bool,
    /// When data was last replaced.
    pub updated_at: Option<DateTime<Utc>>,
}

impl<D: DeserializeOwned> QuerySnapshot<D> {
    pub(crate) fn from_state(state: &EntryState) -> Self {
        let (data, decode_error) = match state.data.clone().map(decode_value::<D>) {
            Some(Ok(data)) => (Some(data), None),
            Some(Err(error)) => (None, Some(error)),
            None => (None, None),
        };
        Self {
            data,
            error: state.error.clone().or(decode_error),
            is_loading: state.is_loading(),
            is_validating: state.is_validating,
            updated_at: state.updated_at,
        }
    }
}

/// Render decision for a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewState<'a, D> {
    /// First load in progress.
    Loading,
    /// The latest fetch failed.
    Failed(&'a FetchError),
    /// Nothing to show.
    Empty,
    /// Data to render.
    Populated(&'a D),
}

impl<D> QuerySnapshot<D> {
    /// Classify the snapshot. Errors win, then loading, then emptiness as
    /// judged by `is_empty`.
    pub fn view_with(&self, is_empty: impl FnOnce(&D) -> bool) -> ViewState<'_, D> {
        if let Some(error) = &self.error {
            return ViewState::Failed(error);
        }
        if self.is_loading {
            return ViewState::Loading;
        }
        match &self.data {
            Some(data) if !is_empty(data) => ViewState::Populated(data),
            _ => ViewState::Empty,
        }
    }
}

impl<T> QuerySnapshot<Vec<T>> {
    /// [`QuerySnapshot::view_with`] for list queries.
    #[must_use]
    pub fn view(&self) -> ViewState<'_, Vec<T>> {
        self.view_with(Vec::is_empty)
    }
}

/// Subscription to one cache key.
///
/// Dropping the handle ends its subscription; focus and reconnect events
/// stop revalidating the key once no interested handle remains.
pub struct QueryHandle<D> {
    cache: QueryCache,
    key: ApiPath,
    _subscription: Arc<QueryConfig>,
    receiver: watch::Receiver<EntryState>,
    marker: PhantomData<fn() -> D>,
}

impl<D: DeserializeOwned> QueryHandle<D> {
    pub(crate) fn new(
        cache: QueryCache,
        key: ApiPath,
        subscription: Arc<QueryConfig>,
        receiver: watch::Receiver<EntryState>,
    ) -> Self {
        Self {
            cache,
            key,
            _subscription: subscription,
            receiver,
            marker: PhantomData,
        }
    }

    /// Cache key of this query.
    #[must_use]
    pub fn key(&self) -> &ApiPath {
        &self.key
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> QuerySnapshot<D> {
        QuerySnapshot::from_state(&self.receiver.borrow())
    }

    /// Revalidate now, bypassing dedupe and backoff, and return the settled
    /// state. Failures are reported through the snapshot's `error`.
    pub async fn mutate(&self) -> QuerySnapshot<D> {
        if let Err(error) = self.cache.mutate(&self.key).await {
            debug!(key = %self.key, error = %error, "query mutate settled with an error");
        }
        self.snapshot()
    }

    /// Wait for the next state change. Returns `None` once the cache has
    /// shut down.
    pub async fn changed(&mut self) -> Option<QuerySnapshot<D>> {
        self.receiver.changed().await.ok()?;
        Some(self.snapshot())
    }

    /// Wait until no fetch is outstanding. Returns `None` once the cache has
    /// shut down.
    pub async fn settled(&mut self) -> Option<QuerySnapshot<D>> {
        let idle = self
            .receiver
            .wait_for(|state| !state.is_validating)
            .await
            .is_ok();
        // wait_for matches the last value even after the sender is gone.
        let open = self.receiver.has_changed().is_ok();
        (idle && open).then(|| self.snapshot())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::{ApiError, ClientError};
    use serde_json::json;

    fn snapshot(state: &EntryState) -> QuerySnapshot<Vec<u32>> {
        QuerySnapshot::from_state(state)
    }

    #[test]
    fn decodes_cached_json() {
        let state = EntryState {
            data: Some(json!([1, 2])),
            ..EntryState::default()
        };
        let view = snapshot(&state);
        assert_eq!(view.data, Some(vec![1, 2]));
        assert_eq!(view.view(), ViewState::Populated(&vec![1, 2]));
    }

    #[test]
    fn decode_mismatch_surfaces_as_client_error() {
        let state = EntryState {
            data: Some(json!({"not": "a list"})),
            ..EntryState::default()
        };
        let view = snapshot(&state);
        assert_eq!(view.data, None);
        assert!(matches!(
            view.error,
            Some(FetchError::Client(ClientError::Decode { .. }))
        ));
    }

    #[test]
    fn error_wins_over_stale_data_when_classifying() {
        let error = FetchError::Api(ApiError::new(500, "boom"));
        let state = EntryState {
            data: Some(json!([1])),
            error: Some(error.clone()),
            ..EntryState::default()
        };
        let view = snapshot(&state);
        assert_eq!(view.data, Some(vec![1]));
        assert_eq!(view.view(), ViewState::Failed(&error));
    }

    #[test]
    fn loading_then_empty() {
        let loading = EntryState {
            is_validating: true,
            ..EntryState::default()
        };
        assert_eq!(snapshot(&loading).view(), ViewState::Loading);

        let empty = EntryState {
            data: Some(json!([])),
            ..EntryState::default()
        };
        assert_eq!(snapshot(&empty).view(), ViewState::Empty);
    }

    #[test]
    fn revalidating_populated_data_is_not_loading() {
        let state = EntryState {
            data: Some(json!([3])),
            is_validating: true,
            ..EntryState::default()
        };
        let view = snapshot(&state);
        assert!(!view.is_loading);
        assert!(view.is_validating);
        assert_eq!(view.view(), ViewState::Populated(&vec![3]));
    }
}
