//! Remote rate provider abstractions

use super::rates::{CurrencyPair, RateSet, Timeline};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Which remote provider rates are fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiProvider {
    #[default]
    ExchangerateHost,
    FrankfurterApp,
    FerEe,
}

impl ApiProvider {
    pub const ALL: [ApiProvider; 3] = [
        ApiProvider::ExchangerateHost,
        ApiProvider::FrankfurterApp,
        ApiProvider::FerEe,
    ];

    /// Maps a stored numeric preference, unknown ids select the default provider.
    pub fn from_id(id: i64) -> Self {
        match id {
            1 => ApiProvider::FrankfurterApp,
            2 => ApiProvider::FerEe,
            _ => ApiProvider::ExchangerateHost,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ApiProvider::ExchangerateHost => 0,
            ApiProvider::FrankfurterApp => 1,
            ApiProvider::FerEe => 2,
        }
    }

    /// fer.ee has no timeseries endpoint.
    pub fn timeline_provider(&self) -> Self {
        match self {
            ApiProvider::FerEe => ApiProvider::ExchangerateHost,
            other => *other,
        }
    }
}

impl Display for ApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ApiProvider::ExchangerateHost => "exchangerate.host",
                ApiProvider::FrankfurterApp => "frankfurter.app",
                ApiProvider::FerEe => "fer.ee",
            }
        )
    }
}

impl FromStr for ApiProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exchangerate.host" | "exchangerate-host" | "0" => Ok(ApiProvider::ExchangerateHost),
            "frankfurter.app" | "frankfurter-app" | "frankfurter" | "1" => {
                Ok(ApiProvider::FrankfurterApp)
            }
            "fer.ee" | "fer-ee" | "feree" | "2" => Ok(ApiProvider::FerEe),
            _ => Err(anyhow::anyhow!("Unknown provider: {}", s)),
        }
    }
}

/// Failure to obtain a payload from a provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The transport produced no content at all.
    #[error("no data received")]
    NoData,
    #[error("{0}")]
    Transport(String),
}

/// A single remote provider with its own request shapes.
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn latest(&self) -> Result<RateSet, FetchError>;

    async fn timeline(
        &self,
        pair: &CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Timeline, FetchError>;
}

/// Fetches payloads from whichever provider is requested. Payloads that encode
/// an application-level failure are returned as `Ok` for the caller to classify.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn fetch_rates(&self, provider: ApiProvider) -> Result<RateSet, FetchError>;

    async fn fetch_timeline(
        &self,
        provider: ApiProvider,
        base: &str,
        target: &str,
    ) -> Result<Timeline, FetchError>;
}
