rust_i18n::i18n!("locales");

pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::ListOptions;
use crate::core::cache::{Cache, Store};
use crate::core::config::AppConfig;
use crate::core::i18n::Language;
use crate::core::market::IndexKind;
use crate::core::session::{BarInterval, ChartSeries, SessionWindow};
use crate::providers::{CachingRecordSource, HttpRecordSource, YahooChartProvider};
use crate::store::KeyValueStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const DATASET_COLLECTION: &str = "datasets";

/// Dashboard pages that can be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    Constituents { index: IndexKind, list: ListOptions },
    History { index: IndexKind, list: ListOptions },
    Quota { list: ListOptions },
    Etf { list: ListOptions },
    Chart { symbol: String, interval: Option<BarInterval> },
    Mag7 { interval: Option<BarInterval> },
}

/// Session policy for `interval`, honouring a configured floor override.
fn session_window(config: &AppConfig, interval: BarInterval) -> SessionWindow {
    let window = SessionWindow::for_interval(interval);
    match config.chart.min_session_samples {
        Some(floor) => window.with_floor(floor),
        None => window,
    }
}

fn chart_provider(config: &AppConfig) -> YahooChartProvider {
    let chart_cache = Arc::new(Cache::<String, ChartSeries>::new());
    YahooChartProvider::new(config.yahoo_base_url(), &config.chart.range, chart_cache)
}

/// Dashboard API client backed by the dataset cache in `store`.
fn record_source(
    config: &AppConfig,
    store: &KeyValueStore,
) -> Result<CachingRecordSource<HttpRecordSource>> {
    let collection = store
        .get_collection(DATASET_COLLECTION, true, true)
        .or_else(|| store.get_collection(DATASET_COLLECTION, false, true))
        .context("Could not open dataset cache")?;
    debug!(persistent = store.is_persistent(), "Dataset cache ready");

    let ttl = Some(Duration::from_secs(config.dashboard_cache_ttl_secs()));
    Ok(CachingRecordSource::new(
        HttpRecordSource::new(config.dashboard_base_url())?,
        collection,
        ttl,
    ))
}

pub async fn run_command(
    command: AppCommand,
    config_path: Option<&str>,
    language: Option<Language>,
) -> Result<()> {
    info!("mktboard starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let language = language.unwrap_or(config.language);
    let page_size = config.page_size;

    match command {
        AppCommand::Chart { symbol, interval } => {
            let interval = interval.unwrap_or(config.chart.interval);
            let window = session_window(&config, interval);
            cli::chart::run(&symbol, &chart_provider(&config), interval, window, language).await
        }
        AppCommand::Mag7 { interval } => {
            let interval = interval.unwrap_or(config.chart.interval);
            let window = session_window(&config, interval);
            cli::chart::run_mag7(&chart_provider(&config), interval, window, language).await
        }
        AppCommand::Constituents { index, list } => {
            let store = KeyValueStore::open(&config.default_data_path()?);
            let source = record_source(&config, &store)?;
            cli::constituents::run(index, &source, &list, page_size, language).await
        }
        AppCommand::History { index, list } => {
            let store = KeyValueStore::open(&config.default_data_path()?);
            let source = record_source(&config, &store)?;
            cli::history::run(index, &source, &list, page_size, language).await
        }
        AppCommand::Quota { list } => {
            let store = KeyValueStore::open(&config.default_data_path()?);
            let source = record_source(&config, &store)?;
            let usd_rate = config.quota.usd_cny_rate;
            cli::quota::run(&source, &list, page_size, usd_rate, language).await
        }
        AppCommand::Etf { list } => {
            let store = KeyValueStore::open(&config.default_data_path()?);
            let source = record_source(&config, &store)?;
            cli::etf::run(&source, &list, page_size, language).await
        }
    }
}
