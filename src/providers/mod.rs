pub mod exchangerate_host;
pub mod frankfurter;
pub mod http;

use crate::core::config::{
    EXCHANGERATE_HOST_URL, FER_EE_URL, FRANKFURTER_APP_URL, ProviderConfig, ProvidersConfig,
};
use crate::core::{ApiProvider, CurrencyPair, FetchError, ProviderClient, RateSet, RateSource, Timeline};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use exchangerate_host::ExchangerateHostProvider;
use frankfurter::FrankfurterProvider;
use tracing::debug;

/// Days covered by a timeline request.
pub const TIMELINE_DAYS: i64 = 365;

/// Trailing window ending at `today`.
pub fn timeline_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (today - Duration::days(TIMELINE_DAYS), today)
}

/// [`ProviderClient`] that talks to the real provider APIs over HTTP.
pub struct HttpProviderClient {
    exchangerate_host: ExchangerateHostProvider,
    frankfurter_app: FrankfurterProvider,
    fer_ee: FrankfurterProvider,
}

impl HttpProviderClient {
    pub fn new(config: &ProvidersConfig) -> Result<Self> {
        let client = http::build_client()?;
        let url = |provider: &Option<ProviderConfig>, default: &str| {
            provider
                .as_ref()
                .map_or(default.to_string(), |p| p.base_url.clone())
        };

        let access_key = config
            .exchangerate_host
            .as_ref()
            .and_then(|p| p.access_key.clone());

        Ok(Self {
            exchangerate_host: ExchangerateHostProvider::new(
                &url(&config.exchangerate_host, EXCHANGERATE_HOST_URL),
                client.clone(),
            )
            .with_access_key(access_key),
            frankfurter_app: FrankfurterProvider::new(
                ApiProvider::FrankfurterApp,
                &url(&config.frankfurter_app, FRANKFURTER_APP_URL),
                client.clone(),
            ),
            fer_ee: FrankfurterProvider::new(
                ApiProvider::FerEe,
                &url(&config.fer_ee, FER_EE_URL),
                client,
            ),
        })
    }

    fn source(&self, provider: ApiProvider) -> &dyn RateSource {
        match provider {
            ApiProvider::ExchangerateHost => &self.exchangerate_host,
            ApiProvider::FrankfurterApp => &self.frankfurter_app,
            ApiProvider::FerEe => &self.fer_ee,
        }
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn fetch_rates(&self, provider: ApiProvider) -> Result<RateSet, FetchError> {
        debug!(%provider, "Fetching latest rates");
        self.source(provider).latest().await
    }

    async fn fetch_timeline(
        &self,
        provider: ApiProvider,
        base: &str,
        target: &str,
    ) -> Result<Timeline, FetchError> {
        let routed = provider.timeline_provider();
        if routed != provider {
            debug!(%provider, %routed, "Provider has no timeline endpoint, rerouting");
        }

        let pair = CurrencyPair::new(base, target);
        let (start, end) = timeline_window(Utc::now().date_naive());
        debug!(provider = %routed, %pair, %start, %end, "Fetching timeline");
        self.source(routed).timeline(&pair, start, end).await
    }
}
