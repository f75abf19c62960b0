//! Local persistence for the last known rates, timelines and the provider choice.

pub mod disk;

use crate::core::{ApiProvider, CurrencyPair, Observable, RateSet, Timeline};
use anyhow::{Context, Result};
use disk::DiskCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{PoisonError, RwLock},
};
use tracing::{debug, info};

const RATES_KEY: &str = "rates";
const PROVIDER_KEY: &str = "api_provider";

fn timeline_key(pair: &CurrencyPair) -> String {
    format!("timeline:{}:{}", pair.base, pair.target)
}

/// Observable cache of provider results, optionally backed by disk.
///
/// Reads never touch the network and never fail; missing data is `None`.
/// Inserts replace the whole value for their key and notify subscribers.
pub struct LocalStore {
    cache: Option<DiskCollection>,
    preferences: Option<DiskCollection>,
    rates: Observable<Option<RateSet>>,
    timelines: RwLock<HashMap<CurrencyPair, Observable<Option<Timeline>>>>,
    provider: Observable<ApiProvider>,
}

impl LocalStore {
    pub fn in_memory() -> Self {
        Self {
            cache: None,
            preferences: None,
            rates: Observable::new(None),
            timelines: RwLock::new(HashMap::new()),
            provider: Observable::new(ApiProvider::default()),
        }
    }

    /// Opens (or creates) a persisted store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create store directory: {}", path.display()))?;
        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let cache = DiskCollection::open(&keyspace, "cache")?;
        let preferences = DiskCollection::open(&keyspace, "preferences")?;

        let rates = cache.get::<RateSet>(RATES_KEY);
        let provider = preferences
            .get::<ApiProvider>(PROVIDER_KEY)
            .unwrap_or_default();
        info!(
            path = %path.display(),
            cached_rates = rates.is_some(),
            %provider,
            "Opened local store"
        );

        Ok(Self {
            cache: Some(cache),
            preferences: Some(preferences),
            rates: Observable::new(rates),
            timelines: RwLock::new(HashMap::new()),
            provider: Observable::new(provider),
        })
    }

    /// Live handle on the current rates.
    pub fn rates(&self) -> Observable<Option<RateSet>> {
        self.rates.clone()
    }

    pub fn insert_rates(&self, rates: RateSet) {
        debug!(base = %rates.base, count = rates.rates.len(), "Storing rates");
        if let Some(cache) = &self.cache {
            cache.put(RATES_KEY, &rates);
        }
        self.rates.publish(Some(rates));
    }

    /// Live handle on the timeline for one pair, loaded from disk on first use.
    pub fn timeline(&self, base: &str, target: &str) -> Observable<Option<Timeline>> {
        let pair = CurrencyPair::new(base, target);
        if let Some(existing) = self
            .timelines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&pair)
        {
            return existing.clone();
        }

        let mut timelines = self
            .timelines
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        timelines
            .entry(pair)
            .or_insert_with_key(|pair| {
                let stored = self
                    .cache
                    .as_ref()
                    .and_then(|cache| cache.get::<Timeline>(&timeline_key(pair)));
                Observable::new(stored)
            })
            .clone()
    }

    pub fn insert_timeline(&self, timeline: Timeline) {
        let pair = timeline.pair();
        debug!(%pair, points = timeline.rates.len(), "Storing timeline");
        if let Some(cache) = &self.cache {
            cache.put(&timeline_key(&pair), &timeline);
        }
        self.timeline(&pair.base, &pair.target)
            .publish(Some(timeline));
    }

    /// Provider used by the next fetch.
    pub fn provider_selection(&self) -> ApiProvider {
        self.provider.get()
    }

    pub fn set_provider_selection(&self, provider: ApiProvider) {
        info!(%provider, "Selecting rate provider");
        if let Some(preferences) = &self.preferences {
            preferences.put(PROVIDER_KEY, &provider);
        }
        self.provider.publish(provider);
    }

    pub fn observe_provider_selection(&self) -> Observable<ApiProvider> {
        self.provider.clone()
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
