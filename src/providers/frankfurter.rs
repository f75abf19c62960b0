use super::http::{endpoint, fetch_json, http_error, parse_api_date};
use crate::core::{
    ApiProvider, CurrencyPair, DailyRate, FetchError, RateSet, RateSource, Timeline,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, instrument};

// Failures come back as `{"message": "not found"}` with a 4xx status.
#[derive(Debug, Deserialize)]
struct LatestResponse {
    message: Option<String>,
    base: Option<String>,
    date: Option<String>,
    rates: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Deserialize)]
struct RangeResponse {
    message: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    rates: Option<BTreeMap<String, BTreeMap<String, f64>>>,
}

/// Speaks the frankfurter API, which fer.ee mirrors.
pub struct FrankfurterProvider {
    provider: ApiProvider,
    base_url: String,
    client: Client,
}

impl FrankfurterProvider {
    pub fn new(provider: ApiProvider, base_url: &str, client: Client) -> Self {
        Self {
            provider,
            base_url: base_url.to_string(),
            client,
        }
    }

    fn latest_into_rates(status: StatusCode, data: LatestResponse) -> Result<RateSet, FetchError> {
        if let Some(message) = data.message {
            return Ok(RateSet::failure(Some(message)));
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

        Ok(RateSet::from_quotes(&base, date, rates, None))
    }

    fn range_into_timeline(
        status: StatusCode,
        pair: &CurrencyPair,
        data: RangeResponse,
    ) -> Result<Timeline, FetchError> {
        if let Some(message) = data.message {
            return Ok(Timeline::failure(pair, Some(message)));
        }
        if !status.is_success() {
            return Err(http_error(status));
        }

        let days = data.rates.ok_or(FetchError::NoData)?;
        let points = days
            .into_iter()
            .filter_map(|(day, rates)| rates.get(&pair.target).map(|rate| (day, *rate)))
            .map(|(day, rate)| {
                Ok(DailyRate {
                    date: parse_api_date(&day)?,
                    rate,
                })
            })
            .collect::<Result<Vec<_>, FetchError>>()?;
        if points.is_empty() {
            return Err(FetchError::NoData);
        }

        let mut timeline = Timeline::new(pair, points);
        // The provider reports the requested window, which may start before the first quote.
        if let Some(start) = data.start_date.as_deref() {
            timeline.start_date = Some(parse_api_date(start)?);
        }
        if let Some(end) = data.end_date.as_deref() {
            timeline.end_date = Some(parse_api_date(end)?);
        }
        Ok(timeline)
    }
}

#[async_trait]
impl RateSource for FrankfurterProvider {
    #[instrument(name = "FrankfurterLatest", skip(self))]
    async fn latest(&self) -> Result<RateSet, FetchError> {
        let url = endpoint(&self.base_url, "latest", &[])?;
        let (status, data) = fetch_json::<LatestResponse>(&self.client, url).await?;
        debug!(provider = %self.provider, ?data, "Decoded latest rates");
        Self::latest_into_rates(status, data)
    }

    #[instrument(name = "FrankfurterTimeline", skip(self, pair), fields(pair = %pair))]
    async fn timeline(
        &self,
        pair: &CurrencyPair,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Timeline, FetchError> {
        let range = format!("{}..{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"));
        let params = [("from", pair.base.clone()), ("to", pair.target.clone())];
        let url = endpoint(&self.base_url, &range, &params)?;
        let (status, data) = fetch_json::<RangeResponse>(&self.client, url).await?;
        debug!(provider = %self.provider, "Decoded timeline");
        Self::range_into_timeline(status, pair, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::http::build_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(uri: &str) -> FrankfurterProvider {
        FrankfurterProvider::new(ApiProvider::FrankfurterApp, uri, build_client().unwrap())
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_latest_rates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"amount": 1.0, "base": "EUR", "date": "2024-03-15", "rates": {"USD": 1.09, "JPY": 161.6}}"#,
            ))
            .mount(&server)
            .await;

        let rates = provider(&server.uri()).latest().await.unwrap();
        assert_eq!(rates.base, "EUR");
        assert_eq!(rates.date, Some(day(2024, 3, 15)));
        assert_eq!(rates.rates.len(), 2);
        assert_eq!(rates.success, None);
    }

    #[tokio::test]
    async fn test_not_found_message_is_soft_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"message": "not found"}"#),
            )
            .mount(&server)
            .await;

        let rates = provider(&server.uri()).latest().await.unwrap();
        assert_eq!(rates.success, Some(false));
        assert_eq!(rates.error.as_deref(), Some("not found"));
    }

    #[tokio::test]
    async fn test_unexpected_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(503).set_body_string("{}"))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).latest().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error: 503 Service Unavailable");
    }

    #[tokio::test]
    async fn test_range_timeline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2023-03-15..2024-03-15"))
            .and(query_param("from", "EUR"))
            .and(query_param("to", "CHF"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "amount": 1.0,
                    "base": "EUR",
                    "start_date": "2023-03-14",
                    "end_date": "2024-03-15",
                    "rates": {
                        "2024-03-15": {"CHF": 0.96},
                        "2023-03-15": {"CHF": 0.98}
                    }
                }"#,
            ))
            .mount(&server)
            .await;

        let pair = CurrencyPair::new("EUR", "CHF");
        let timeline = provider(&server.uri())
            .timeline(&pair, day(2023, 3, 15), day(2024, 3, 15))
            .await
            .unwrap();

        assert_eq!(timeline.rates.len(), 2);
        assert_eq!(timeline.rates[0].date, day(2023, 3, 15));
        assert_eq!(timeline.latest().unwrap().rate, 0.96);
        assert_eq!(timeline.start_date, Some(day(2023, 3, 14)));
        assert_eq!(timeline.end_date, Some(day(2024, 3, 15)));
    }

    #[tokio::test]
    async fn test_latest_with_empty_rates_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"base": "USD", "date": "2024-01-02", "rates": {}}"#,
            ))
            .mount(&server)
            .await;

        let err = provider(&server.uri()).latest().await.unwrap_err();
        assert_eq!(err, FetchError::NoData);
    }

    #[tokio::test]
    async fn test_empty_range_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/2023-03-15..2024-03-15"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"base": "EUR", "start_date": "2023-03-15", "end_date": "2024-03-15", "rates": {}}"#,
            ))
            .mount(&server)
            .await;

        let pair = CurrencyPair::new("EUR", "CHF");
        let err = provider(&server.uri())
            .timeline(&pair, day(2023, 3, 15), day(2024, 3, 15))
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::NoData);
    }
}
