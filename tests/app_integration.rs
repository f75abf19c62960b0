use fxsync::core::{ApiProvider, RateSet};
use fxsync::providers::HttpProviderClient;
use fxsync::store::LocalStore;
use fxsync::sync::{RateSync, SyncError};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

// Adds automatic logging to test
mod test_utils {
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub async fn create_mock_server(url_path: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub async fn create_range_mock_server(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/\d{4}-\d{2}-\d{2}\.\.\d{4}-\d{2}-\d{2}$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    pub fn write_config(
        path: &std::path::Path,
        data_path: &std::path::Path,
        host_uri: &str,
        frankfurter_uri: &str,
    ) {
        let config_content = format!(
            r#"
providers:
  exchangerate_host:
    base_url: "{host_uri}"
  frankfurter_app:
    base_url: "{frankfurter_uri}"
  fer_ee:
    base_url: "{frankfurter_uri}"
data_path: "{}"
min_loading_ms: 0
"#,
            data_path.display()
        );
        std::fs::write(path, config_content).expect("Failed to write config file");
    }
}

const LATEST_USD: &str =
    r#"{"success": null, "base": "USD", "date": "2024-01-01", "rates": {"EUR": 0.9}}"#;

fn stored_rates(data_path: &Path) -> Option<RateSet> {
    LocalStore::open(&data_path.join("store"))
        .unwrap()
        .rates()
        .get()
}

#[test_log::test(tokio::test)]
async fn test_refresh_against_http_provider() {
    let mock_server = test_utils::create_mock_server("/latest", LATEST_USD).await;
    let config: fxsync::core::config::ProvidersConfig = serde_yaml::from_str(&format!(
        "exchangerate_host:\n  base_url: \"{}\"",
        mock_server.uri()
    ))
    .unwrap();
    let client = Arc::new(HttpProviderClient::new(&config).unwrap());
    let sync = RateSync::new(Arc::new(LocalStore::in_memory()), client);

    let start = Instant::now();
    let refresh = sync.refresh_rates();
    let rates = refresh.data();
    let mut loading = sync.observe_loading();
    assert_eq!(loading.recv().await, Some(true));
    assert_eq!(loading.recv().await, Some(false));
    let elapsed = start.elapsed();
    info!(?elapsed, "Loading cleared");
    assert!(elapsed >= Duration::from_millis(500));

    refresh.finished().await.unwrap();
    let rates = rates.get().expect("rates stored");
    assert_eq!(rates.base, "USD");
    assert_eq!(rates.date.unwrap().to_string(), "2024-01-01");
    assert_eq!(rates.rates.get("EUR"), Some(&0.9));
}

#[test_log::test(tokio::test)]
async fn test_soft_error_against_http_provider() {
    let mock_server =
        test_utils::create_mock_server("/latest", r#"{"success": false, "error": "rate limit"}"#)
            .await;
    let config: fxsync::core::config::ProvidersConfig = serde_yaml::from_str(&format!(
        "exchangerate_host:\n  base_url: \"{}\"",
        mock_server.uri()
    ))
    .unwrap();
    let client = Arc::new(HttpProviderClient::new(&config).unwrap());
    let sync = RateSync::new(Arc::new(LocalStore::in_memory()), client);

    let outcome = sync.refresh_rates().finished().await;
    assert_eq!(outcome, Err(SyncError::Provider("rate limit".to_string())));
    assert_eq!(sync.last_error().as_deref(), Some("error: rate limit"));
    assert!(!sync.is_loading());
    assert!(sync.store().rates().get().is_none());
}

#[test_log::test(tokio::test)]
async fn test_empty_rates_keep_cached_set() {
    let mock_server = test_utils::create_mock_server(
        "/latest",
        r#"{"base": "USD", "date": "2024-01-02", "rates": {}}"#,
    )
    .await;
    let config: fxsync::core::config::ProvidersConfig = serde_yaml::from_str(&format!(
        "exchangerate_host:\n  base_url: \"{}\"",
        mock_server.uri()
    ))
    .unwrap();
    let client = Arc::new(HttpProviderClient::new(&config).unwrap());
    let store = Arc::new(LocalStore::in_memory());
    let cached: RateSet = serde_json::from_str(LATEST_USD).unwrap();
    store.insert_rates(cached.clone());
    let sync = RateSync::new(store, client);

    let outcome = sync.refresh_rates().finished().await;
    assert_eq!(outcome, Err(SyncError::NoData));
    assert_eq!(sync.last_error().as_deref(), Some("no data available"));
    assert_eq!(sync.store().rates().get(), Some(cached));
    assert!(!sync.is_loading());
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let host = test_utils::create_mock_server("/latest", LATEST_USD).await;
    let frankfurter = test_utils::create_mock_server("/latest", "{}").await;

    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(
        config_file.path(),
        data_dir.path(),
        &host.uri(),
        &frankfurter.uri(),
    );
    let config_path = config_file.path().to_str().unwrap();

    let result = fxsync::run_command(fxsync::AppCommand::Rates, Some(config_path)).await;
    assert!(result.is_ok(), "Rates command failed with: {:?}", result.err());

    let result = fxsync::run_command(
        fxsync::AppCommand::Convert {
            amount: 10.0,
            from: "USD".to_string(),
            to: "EUR".to_string(),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Convert command failed with: {:?}", result.err());

    let rates = stored_rates(data_dir.path()).expect("rates persisted");
    assert_eq!(rates.base, "USD");
    assert_eq!(rates.rates.get("EUR"), Some(&0.9));
}

#[test_log::test(tokio::test)]
async fn test_provider_switch_and_cached_fallback() {
    let host = test_utils::create_mock_server("/latest", LATEST_USD).await;
    let frankfurter =
        test_utils::create_mock_server("/latest", r#"{"message": "not found"}"#).await;

    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(
        config_file.path(),
        data_dir.path(),
        &host.uri(),
        &frankfurter.uri(),
    );
    let config_path = config_file.path().to_str().unwrap();

    // Empty cache: a failing provider is an error.
    fxsync::run_command(
        fxsync::AppCommand::Provider(Some("frankfurter".to_string())),
        Some(config_path),
    )
    .await
    .unwrap();
    let err = fxsync::run_command(fxsync::AppCommand::Rates, Some(config_path))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "error: not found");

    // Back to the working provider, then fail again with a warm cache.
    fxsync::run_command(
        fxsync::AppCommand::Provider(Some("exchangerate.host".to_string())),
        Some(config_path),
    )
    .await
    .unwrap();
    fxsync::run_command(fxsync::AppCommand::Rates, Some(config_path))
        .await
        .unwrap();
    fxsync::run_command(
        fxsync::AppCommand::Provider(Some("1".to_string())),
        Some(config_path),
    )
    .await
    .unwrap();
    let result = fxsync::run_command(fxsync::AppCommand::Rates, Some(config_path)).await;
    assert!(result.is_ok(), "Cached fallback failed with: {:?}", result.err());

    let store = LocalStore::open(&data_dir.path().join("store")).unwrap();
    assert_eq!(store.provider_selection(), ApiProvider::FrankfurterApp);
    assert_eq!(store.rates().get().unwrap().base, "USD");
}

#[test_log::test(tokio::test)]
async fn test_timeline_flow_with_mock() {
    let host = test_utils::create_mock_server("/latest", LATEST_USD).await;
    let frankfurter = test_utils::create_range_mock_server(
        r#"{
            "base": "USD",
            "start_date": "2023-01-02",
            "end_date": "2024-01-02",
            "rates": {
                "2023-01-02": {"EUR": 0.93},
                "2024-01-02": {"EUR": 0.91}
            }
        }"#,
    )
    .await;

    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    test_utils::write_config(
        config_file.path(),
        data_dir.path(),
        &host.uri(),
        &frankfurter.uri(),
    );
    let config_path = config_file.path().to_str().unwrap();

    fxsync::run_command(
        fxsync::AppCommand::Provider(Some("frankfurter.app".to_string())),
        Some(config_path),
    )
    .await
    .unwrap();
    let result = fxsync::run_command(
        fxsync::AppCommand::Timeline {
            base: "usd".to_string(),
            target: "eur".to_string(),
        },
        Some(config_path),
    )
    .await;
    assert!(result.is_ok(), "Timeline command failed with: {:?}", result.err());

    let store = LocalStore::open(&data_dir.path().join("store")).unwrap();
    let timeline = store.timeline("USD", "EUR").get().expect("timeline persisted");
    assert_eq!(timeline.rates.len(), 2);
    assert_eq!(timeline.latest().unwrap().rate, 0.91);
}
