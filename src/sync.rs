//! Background refresh of rates and timelines.
//!
//! A refresh raises the loading flag, fetches once from the selected provider
//! on a spawned task and either stores the result or publishes an error.
//! Successful refreshes keep the flag raised for at least the configured
//! minimum so a fast response does not make the indicator flicker. Failed
//! refreshes lower it straight away.
//!
//! Refreshes are not de-duplicated: concurrent calls each fetch, and the last
//! store write wins. There is no retry and no cancellation.

use crate::core::{FetchError, Observable, Payload, ProviderClient, RateSet, Subscription, Timeline};
use crate::store::LocalStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{Instrument, debug, info_span, warn};

pub const DEFAULT_MIN_LOADING: Duration = Duration::from_millis(500);

/// Why a refresh did not update the store. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("no data available")]
    NoData,
    #[error("error: {0}")]
    Transport(String),
    #[error("error: {0}")]
    Provider(String),
    #[error("API error")]
    Unknown,
}

impl From<FetchError> for SyncError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NoData => SyncError::NoData,
            FetchError::Transport(message) if message.trim().is_empty() => SyncError::Unknown,
            FetchError::Transport(message) => SyncError::Transport(message),
        }
    }
}

/// Splits a provider result into a usable payload or the error to report.
pub fn classify<T: Payload>(result: Result<T, FetchError>) -> Result<T, SyncError> {
    let payload = result?;
    if payload.is_success() {
        return Ok(payload);
    }
    match payload.error_message().map(str::trim) {
        Some(message) if !message.is_empty() => Err(SyncError::Provider(message.to_string())),
        _ => Err(SyncError::Unknown),
    }
}

/// A started refresh: the live value it will update plus the background task.
pub struct Refresh<T> {
    data: Observable<Option<T>>,
    task: JoinHandle<Result<(), SyncError>>,
    loading: Observable<bool>,
}

impl<T: Clone + Send + 'static> Refresh<T> {
    pub fn data(&self) -> Observable<Option<T>> {
        self.data.clone()
    }

    pub fn into_data(self) -> Observable<Option<T>> {
        self.data
    }

    /// Waits for the background task and returns its outcome.
    ///
    /// A task that panicked lowers the loading flag here, since it never reached
    /// its own cleanup.
    pub async fn finished(self) -> Result<(), SyncError> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Refresh task did not complete");
                self.loading.publish(false);
                Err(SyncError::Unknown)
            }
        }
    }
}

/// Coordinates provider fetches with the local store and exposes loading and
/// error state. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RateSync {
    store: Arc<LocalStore>,
    client: Arc<dyn ProviderClient>,
    loading: Observable<bool>,
    error: Observable<Option<String>>,
    min_loading: Duration,
}

impl RateSync {
    pub fn new(store: Arc<LocalStore>, client: Arc<dyn ProviderClient>) -> Self {
        Self {
            store,
            client,
            loading: Observable::new(false),
            error: Observable::new(None),
            min_loading: DEFAULT_MIN_LOADING,
        }
    }

    pub fn with_min_loading(mut self, min_loading: Duration) -> Self {
        self.min_loading = min_loading;
        self
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    /// Starts a background refresh of the latest rates and returns the
    /// store's live rates immediately. Must be called inside a tokio runtime.
    pub fn refresh_rates(&self) -> Refresh<RateSet> {
        let start = Instant::now();
        self.loading.publish(true);

        let this = self.clone();
        let task = tokio::spawn(
            async move {
                let provider = this.store.provider_selection();
                debug!(%provider, "Refreshing rates");
                let result = this.client.fetch_rates(provider).await;
                this.complete(start, result, |rates| this.store.insert_rates(rates))
                    .await
            }
            .instrument(info_span!("refresh_rates")),
        );

        Refresh {
            data: self.store.rates(),
            task,
            loading: self.loading.clone(),
        }
    }

    /// Starts a background refresh of the trailing-year timeline for one pair.
    pub fn refresh_timeline(&self, base: &str, target: &str) -> Refresh<Timeline> {
        let start = Instant::now();
        self.loading.publish(true);

        let this = self.clone();
        let (base, target) = (base.to_string(), target.to_string());
        let span = info_span!("refresh_timeline", %base, %target);
        let data = self.store.timeline(&base, &target);
        let task = tokio::spawn(
            async move {
                let provider = this.store.provider_selection();
                debug!(%provider, "Refreshing timeline");
                let result = this.client.fetch_timeline(provider, &base, &target).await;
                this.complete(start, result, |timeline| {
                    this.store.insert_timeline(timeline)
                })
                .await
            }
            .instrument(span),
        );

        Refresh {
            data,
            task,
            loading: self.loading.clone(),
        }
    }

    async fn complete<T: Payload>(
        &self,
        start: Instant,
        result: Result<T, FetchError>,
        write: impl FnOnce(T),
    ) -> Result<(), SyncError> {
        match classify(result) {
            Ok(payload) => {
                write(payload);
                self.settle_loading(start).await;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Refresh failed");
                self.loading.publish(false);
                self.error.publish(Some(err.to_string()));
                Err(err)
            }
        }
    }

    async fn settle_loading(&self, start: Instant) {
        let elapsed = start.elapsed();
        if elapsed < self.min_loading {
            let remaining = self.min_loading - elapsed;
            debug!(?remaining, "Holding loading state");
            sleep(remaining).await;
        }
        self.loading.publish(false);
    }

    pub fn observe_rates(&self) -> Subscription<Option<RateSet>> {
        self.store.rates().subscribe()
    }

    pub fn observe_timeline(&self, base: &str, target: &str) -> Subscription<Option<Timeline>> {
        self.store.timeline(base, target).subscribe()
    }

    pub fn observe_loading(&self) -> Subscription<bool> {
        self.loading.subscribe()
    }

    /// Last reported error message. Not cleared by later successes.
    pub fn observe_error(&self) -> Subscription<Option<String>> {
        self.error.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn last_error(&self) -> Option<String> {
        self.error.get()
    }
}
