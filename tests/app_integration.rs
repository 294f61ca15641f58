use mktboard::AppCommand;
use mktboard::cli::ListOptions;
use mktboard::core::market::IndexKind;
use mktboard::core::{BarInterval, Language, SortDirection};
use std::fs;
use tempfile::{NamedTempFile, TempDir};
use tracing::info;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Adds automatic logging to test
mod test_utils {
    use super::*;

    pub async fn create_mock_server(url_path: &str, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(url_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// Writes a config pointing both providers at `base_url` with its own data dir.
    pub fn write_config(base_url: &str, data_dir: &TempDir) -> NamedTempFile {
        let config_file = NamedTempFile::new().expect("Failed to create temp file");
        let config_content = format!(
            r#"
            language: en
            page_size: 10
            providers:
              yahoo:
                base_url: {base_url}
              dashboard:
                base_url: {base_url}
                cache_ttl_secs: 60
            chart:
              interval: 1m
              range: 2d
            data_path: {}
        "#,
            data_dir.path().display()
        );
        fs::write(config_file.path(), &config_content).expect("Failed to write config file");
        config_file
    }

    /// One-minute chart payload for a single session starting at 2024-03-05 09:30 ET.
    pub fn chart_response(bars: usize) -> String {
        let start = 1_709_649_000_i64;
        let timestamps: Vec<String> = (0..bars)
            .map(|i| (start + 60 * i as i64).to_string())
            .collect();
        let closes: Vec<String> = (0..bars)
            .map(|i| format!("{:.2}", 180.0 + i as f64 * 0.05))
            .collect();
        format!(
            r#"{{
                "chart": {{
                    "result": [{{
                        "meta": {{ "currency": "USD", "previousClose": 179.5 }},
                        "timestamp": [{}],
                        "indicators": {{ "quote": [{{ "close": [{}] }}] }}
                    }}]
                }}
            }}"#,
            timestamps.join(","),
            closes.join(",")
        )
    }
}

#[test_log::test(tokio::test)]
async fn test_constituents_flow_with_mock() {
    let mock_response = r#"[
        {"rank": 1, "symbol": "AAPL", "name": "Apple Inc.", "sector": "Technology",
         "weight": "7.1", "price": "189.50", "change": 1.2, "ath_price": 199.6},
        {"rank": 2, "symbol": "MSFT", "name": "Microsoft", "sector": "Technology",
         "weight": 6.8, "price": 415.1, "change": -0.4, "ath_price": null}
    ]"#;
    let mock_server =
        test_utils::create_mock_server("/api/constituents/nasdaq100", mock_response).await;
    let data_dir = TempDir::new().unwrap();
    let config_file = test_utils::write_config(&mock_server.uri(), &data_dir);

    let command = AppCommand::Constituents {
        index: IndexKind::Nasdaq100,
        list: ListOptions {
            sort: Some("price".to_string()),
            direction: Some(SortDirection::Ascending),
            page: 1,
            filters: Vec::new(),
        },
    };
    info!(?command, "Running constituents");

    let result =
        mktboard::run_command(command, Some(config_file.path().to_str().unwrap()), None).await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_history_flow_with_mock() {
    let mock_response = r#"{"data": [
        {"date": "2023-01-01", "year": 2023, "month": 1, "close": 12000.5},
        {"date": "2023-12-01", "year": 2023, "month": 12, "close": 16825.93},
        {"date": "2024-01-01", "year": 2024, "month": 1, "close": 17000.0}
    ]}"#;
    let mock_server =
        test_utils::create_mock_server("/api/index-history/nasdaq100", mock_response).await;
    let data_dir = TempDir::new().unwrap();
    let config_file = test_utils::write_config(&mock_server.uri(), &data_dir);

    let result = mktboard::run_command(
        AppCommand::History {
            index: IndexKind::Nasdaq100,
            list: ListOptions::default(),
        },
        Some(config_file.path().to_str().unwrap()),
        Some(Language::Chinese),
    )
    .await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_quota_flow_sends_filters() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/fund-quota"))
        .and(query_param("currency", "USD"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"data": [
                {"fund_code": "000041", "fund_name": "华夏全球精选(QDII)美元A",
                 "fund_company": "华夏基金管理有限公司", "quota": "1,000"}
            ]}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    let data_dir = TempDir::new().unwrap();
    let config_file = test_utils::write_config(&mock_server.uri(), &data_dir);

    let command = AppCommand::Quota {
        list: ListOptions {
            filters: vec![("currency".to_string(), "USD".to_string())],
            ..Default::default()
        },
    };
    let result = mktboard::run_command(
        command,
        Some(config_file.path().to_str().unwrap()),
        Some(Language::Chinese),
    )
    .await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_etf_flow_fetches_both_datasets() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/etfs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"ticker": "SPY", "assetClass": "Equity", "aum": 5.0e11, "etfLeverage": "1x"}]"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/etfs/leveraged"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"ticker": "TQQQ", "assetClass": "Equity", "aum": 2.0e10, "etfLeverage": "3x"}]"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;
    let data_dir = TempDir::new().unwrap();
    let config_file = test_utils::write_config(&mock_server.uri(), &data_dir);

    let result = mktboard::run_command(
        AppCommand::Etf {
            list: ListOptions::default(),
        },
        Some(config_file.path().to_str().unwrap()),
        None,
    )
    .await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_unavailable_api_degrades_to_empty_view() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/constituents/dow"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    let data_dir = TempDir::new().unwrap();
    let config_file = test_utils::write_config(&mock_server.uri(), &data_dir);

    let result = mktboard::run_command(
        AppCommand::Constituents {
            index: IndexKind::Dow,
            list: ListOptions::default(),
        },
        Some(config_file.path().to_str().unwrap()),
        None,
    )
    .await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_chart_flow_with_mock() {
    let mock_server =
        test_utils::create_mock_server("/v8/finance/chart/AAPL", &test_utils::chart_response(60))
            .await;
    let data_dir = TempDir::new().unwrap();
    let config_file = test_utils::write_config(&mock_server.uri(), &data_dir);

    let result = mktboard::run_command(
        AppCommand::Chart {
            symbol: "aapl".to_string(),
            interval: Some(BarInterval::OneMinute),
        },
        Some(config_file.path().to_str().unwrap()),
        None,
    )
    .await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_mag7_flow_tolerates_failures() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/TSLA"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/v8/finance/chart/(AAPL|MSFT|GOOGL|AMZN|META|NVDA)$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(test_utils::chart_response(10)))
        .expect(6)
        .mount(&mock_server)
        .await;
    let data_dir = TempDir::new().unwrap();
    let config_file = test_utils::write_config(&mock_server.uri(), &data_dir);

    let result = mktboard::run_command(
        AppCommand::Mag7 { interval: None },
        Some(config_file.path().to_str().unwrap()),
        None,
    )
    .await;
    assert!(result.is_ok(), "Command failed with: {:?}", result.err());
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_fails() {
    let config_file = NamedTempFile::new().unwrap();
    fs::write(config_file.path(), "page_size: [1, 2").unwrap();

    let result = mktboard::run_command(
        AppCommand::Mag7 { interval: None },
        Some(config_file.path().to_str().unwrap()),
        None,
    )
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}
