use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::session::{BarInterval, ChartSeries, PricePoint};
use crate::core::source::ChartProvider;
use crate::providers::util::{DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS, send_with_retry};

/// Intraday bars from the Yahoo Finance chart API.
pub struct YahooChartProvider {
    base_url: String,
    range: String,
    cache: Arc<Cache<String, ChartSeries>>,
}

impl YahooChartProvider {
    pub fn new(base_url: &str, range: &str, cache: Arc<Cache<String, ChartSeries>>) -> Self {
        YahooChartProvider {
            base_url: base_url.to_string(),
            range: range.to_string(),
            cache,
        }
    }
}

#[derive(Deserialize, Debug)]
struct YahooChartResponse {
    chart: ChartResult,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    result: Option<Vec<ChartItem>>,
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    description: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct ChartItem {
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    currency: Option<String>,
    #[serde(alias = "shortName")]
    short_name: Option<String>,
    #[serde(alias = "previousClose")]
    previous_close: Option<f64>,
    #[serde(alias = "chartPreviousClose")]
    chart_previous_close: Option<f64>,
}

fn to_series(item: ChartItem) -> ChartSeries {
    let closes = item
        .indicators
        .and_then(|inds| inds.quote.into_iter().next())
        .and_then(|q| q.close)
        .unwrap_or_default();

    let points = item
        .timestamp
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .filter_map(|(i, ts)| {
            let timestamp = Utc.timestamp_opt(ts, 0).single()?;
            Some(PricePoint {
                timestamp,
                price: closes.get(i).copied().flatten(),
            })
        })
        .collect();

    ChartSeries {
        points,
        previous_close: item.meta.previous_close.or(item.meta.chart_previous_close),
        currency: item.meta.currency,
        short_name: item.meta.short_name,
    }
}

#[async_trait]
impl ChartProvider for YahooChartProvider {
    #[instrument(
        name = "YahooChartFetch",
        skip(self),
        fields(symbol = %symbol, interval = %interval)
    )]
    async fn fetch_intraday(&self, symbol: &str, interval: BarInterval) -> Result<ChartSeries> {
        let cache_key = format!("{symbol}:{interval}:{}", self.range);
        if let Some(cached) = self.cache.get(&cache_key).await {
            return Ok(cached);
        }

        let url = format!(
            "{}/v8/finance/chart/{}?interval={}&range={}",
            self.base_url, symbol, interval, self.range
        );
        debug!("Requesting chart data from {}", url);

        let client = reqwest::Client::builder().user_agent("mktboard/1.0").build()?;
        let response = send_with_retry(&client, &url, DEFAULT_RETRIES, DEFAULT_RETRY_DELAY_MS)
            .await
            .with_context(|| format!("Request error for symbol: {symbol} URL: {url}"))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooChartResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse chart response for {}: {}", symbol, e))?;

        if let Some(error) = data.chart.error {
            return Err(anyhow!(
                "Chart API error for {}: {}",
                symbol,
                error.description.unwrap_or_default()
            ));
        }

        let item = data
            .chart
            .result
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| anyhow!("No chart data found for symbol: {}", symbol))?;

        let series = to_series(item);
        debug!(points = series.points.len(), "Received chart series");

        self.cache.put(cache_key, series.clone()).await;
        Ok(series)
    }
}
