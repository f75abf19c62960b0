use super::http::{endpoint, fetch_json, http_error, parse_api_date};
use crate::core::{CurrencyPair, DailyRate, FetchError, RateSet, RateSource, Timeline};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// `error` is a plain string on older deployments and an object on newer ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiError {
    Text(String),
    Detail {
        info: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
    },
}

impl ApiError {
    fn into_message(self) -> Option<String> {
        match self {
            ApiError::Text(text) => Some(text),
            ApiError::Detail { info, kind } => info.or(kind),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    success: Option<bool>,
    error: Option<ApiError>,
    base: Option<String>,
    date: Option<String>,
    rates: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    success: Option<bool>,
    error: Option<ApiError>,
    rates: Option<BTreeMap<String, BTreeMap<String, f64>>>,
}

pub struct ExchangerateHostProvider {
    base_url: String,
    access_key: Option<String>,
    client: Client,
}

impl ExchangerateHostProvider {
    pub fn new(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.to_string(),
            access_key: None,
            client,
        }
    }

    pub fn with_access_key(mut self, access_key: Option<String>) -> Self {
        self.access_key = access_key;
        self
    }

    fn params(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(key) = &self.access_key {
            params.push(("access_key", key.clone()));
        }
        params
    }

    fn latest_into_rates(status: StatusCode, data: LatestResponse) -> Result<RateSet, FetchError> {
        if data.success == Some(false) || data.error.is_some() {
            return Ok(RateSet::failure(data.error.and_then(ApiError::into_message)));
        }
        if !status.is_success() {
            return Err(http_error(status));
        }

        let (Some(base), Some(rates)) = (data.base, data.rates) else {
            return Err(FetchError::NoData);
        };
        if rates.is_empty() {
            return Err(FetchError::NoData);
        }
        let date = data.date.as_deref().map(parse_api_date).transpose()?;

        Ok(RateSet::from_quotes(&base, date, rates, data.success))
    }

    fn series_into_timeline(
        status: StatusCode,
        pair: &CurrencyPair,
        data: TimeseriesResponse,
    ) -> Result<Timeline, FetchError> {
        if data.success == Some(false) || data.error.is_some() {
            return Ok(Timeline::failure(
                pair,
                data.error.and_then(ApiError::into_message),
            ));
        }
        if !status.is_success() {
            return Err(http_error(status));
        }

        let days = data.rates.ok_or(FetchError::NoData)?;
        let mut points = Vec::with_capacity(days.len());
        for (day, rates) in days {
            if let Some(rate) = rates.get(&pair.target) {
                points.push(DailyRate {
                    date: parse_api_date(&day)?,
                    rate: *rate,
                });
            }
        }
        if points.is_empty() {
            return Err(FetchError::NoData);
        }

        let mut timeline = Timeline::new(pair, points);
        timeline.success = data.success;
        Ok(timeline)
    }
}

#[async_trait]
impl RateSource for ExchangerateHostProvider {
    #[instrument(name = "ExchangerateHostLatest", skip(self))]
    async fn latest(&self) -> Result<RateSet, FetchError> {
        let url = endpoint(&self.base_url, "latest", &self.params(Vec::new()))?;
        let (status, data) = fetch_json::<LatestResponse>(&self.client, url).await?;
        debug!(?data, "Decoded latest rates");
        Self::latest_into_rates(status, data)
    }

    #[instrument(name = "ExchangerateHostTimeline", skip(self, pair), fields(pair = %pair))]
    async fn timeline(
        &self,
        pair: &CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Timeline, FetchError> {
        let params = self.params(vec![
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
            ("base", pair.base.clone()),
            ("symbols", pair.target.clone()),
        ]);
        let url = endpoint(&self.base_url, "timeseries", &params)?;
        let (status, data) = fetch_json::<TimeseriesResponse>(&self.client, url).await?;
        Self::series_into_timeline(status, pair, data)
    }
}
