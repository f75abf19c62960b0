use crate::core::FetchError;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

pub fn build_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(concat!("fxsync/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Joins `path` onto `base_url` and appends the query parameters.
pub fn endpoint(base_url: &str, path: &str, params: &[(&str, String)]) -> Result<Url, FetchError> {
    let raw = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let url = if params.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, params)
    };
    url.map_err(|e| FetchError::Transport(format!("Invalid URL {raw}: {e}")))
}

pub fn parse_api_date(date_str: &str) -> Result<NaiveDate, FetchError> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|e| FetchError::Transport(format!("Failed to parse date {date_str}: {e}")))
}

pub fn http_error(status: StatusCode) -> FetchError {
    FetchError::Transport(format!("HTTP error: {status}"))
}

/// Sends a GET request and decodes the JSON body, whatever the status code.
///
/// A request that never got a response, a `204 No Content` and an empty
/// successful body all map to [`FetchError::NoData`].
pub async fn fetch_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
) -> Result<(StatusCode, T), FetchError> {
    debug!("Requesting {}", url);

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) if e.is_connect() => {
            debug!(error = %e, "No response from {}", url);
            return Err(FetchError::NoData);
        }
        Err(e) => return Err(FetchError::Transport(format!("Request error: {e}"))),
    };

    let status = response.status();
    debug!(%status, "Received provider response");
    if status == StatusCode::NO_CONTENT {
        return Err(FetchError::NoData);
    }

    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Transport(format!("Failed to read response: {e}")))?;

    if body.trim().is_empty() {
        return if status.is_success() {
            Err(FetchError::NoData)
        } else {
            Err(http_error(status))
        };
    }

    match serde_json::from_str::<T>(&body) {
        Ok(payload) => Ok((status, payload)),
        Err(_) if !status.is_success() => Err(http_error(status)),
        Err(e) => {
            error!(
                error = ?e,
                response = %body,
                "Failed to parse provider response"
            );
            Err(FetchError::Transport(format!("Failed to parse response: {e}")))
        }
    }
}
