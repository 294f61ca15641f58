use crate::core::i18n::Language;
use crate::core::session::BarInterval;
use crate::core::table::DEFAULT_USD_CNY_RATE;
use crate::core::view::DEFAULT_PAGE_SIZE;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DashboardProviderConfig {
    pub base_url: String,
    /// Seconds a fetched dataset is served from the local store.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
    pub dashboard: Option<DashboardProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
            dashboard: Some(DashboardProviderConfig {
                base_url: "http://localhost:3000".to_string(),
                cache_ttl_secs: default_cache_ttl_secs(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChartConfig {
    #[serde(default = "default_interval")]
    pub interval: BarInterval,
    /// Lookback requested from the chart API. Covers more than one session
    /// so a full day is available near the open.
    #[serde(default = "default_range")]
    pub range: String,
    /// Overrides the interval-derived session floor.
    pub min_session_samples: Option<usize>,
}

fn default_interval() -> BarInterval {
    BarInterval::OneMinute
}

fn default_range() -> String {
    "2d".to_string()
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            range: default_range(),
            min_session_samples: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct QuotaConfig {
    #[serde(default = "default_usd_cny_rate")]
    pub usd_cny_rate: f64,
}

fn default_usd_cny_rate() -> f64 {
    DEFAULT_USD_CNY_RATE
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            usd_cny_rate: default_usd_cny_rate(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub language: Language,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            page_size: default_page_size(),
            providers: ProvidersConfig::default(),
            chart: ChartConfig::default(),
            quota: QuotaConfig::default(),
            data_path: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "mktboard", "mktboard")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "mktboard", "mktboard")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn yahoo_base_url(&self) -> &str {
        self.providers
            .yahoo
            .as_ref()
            .map_or("https://query1.finance.yahoo.com", |p| &p.base_url)
    }

    pub fn dashboard_base_url(&self) -> &str {
        self.providers
            .dashboard
            .as_ref()
            .map_or("http://localhost:3000", |p| &p.base_url)
    }

    pub fn dashboard_cache_ttl_secs(&self) -> u64 {
        self.providers
            .dashboard
            .as_ref()
            .map_or(default_cache_ttl_secs(), |p| p.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
language: zh-CN
page_size: 50
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
  dashboard:
    base_url: "http://example.com/api"
    cache_ttl_secs: 60
chart:
  interval: 5m
  range: 5d
  min_session_samples: 20
quota:
  usd_cny_rate: 7.2
data_path: /tmp/mktboard
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.language, Language::Chinese);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.yahoo_base_url(), "http://example.com/yahoo");
        assert_eq!(config.dashboard_base_url(), "http://example.com/api");
        assert_eq!(config.dashboard_cache_ttl_secs(), 60);
        assert_eq!(config.chart.interval, BarInterval::FiveMinutes);
        assert_eq!(config.chart.range, "5d");
        assert_eq!(config.chart.min_session_samples, Some(20));
        assert_eq!(config.quota.usd_cny_rate, 7.2);
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/mktboard")
        );
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("language: en").unwrap();
        assert_eq!(config.language, Language::English);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.yahoo_base_url(), "https://query1.finance.yahoo.com");
        assert_eq!(config.chart.interval, BarInterval::OneMinute);
        assert_eq!(config.chart.range, "2d");
        assert_eq!(config.quota.usd_cny_rate, 7.0);

        let config: AppConfig = serde_yaml::from_str(
            r#"
providers:
  dashboard:
    base_url: "http://db.local"
"#,
        )
        .unwrap();
        assert!(config.providers.yahoo.is_none());
        assert_eq!(config.dashboard_cache_ttl_secs(), 300);
    }

    #[test]
    fn test_invalid_config_reports_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "page_size: [not a number").unwrap();
        let err = AppConfig::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
