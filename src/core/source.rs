//! Data source abstractions

use crate::core::market::IndexKind;
use crate::core::record::Record;
use crate::core::session::{BarInterval, ChartSeries};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Tables served by the dashboard data API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Constituents(IndexKind),
    /// Monthly closes of the index itself.
    IndexHistory(IndexKind),
    FundQuota,
    Etfs,
    LeveragedEtfs,
}

impl Dataset {
    /// Path below the API base URL.
    pub fn path(&self) -> String {
        match self {
            Dataset::Constituents(index) => format!("/api/constituents/{}", index.slug()),
            Dataset::IndexHistory(index) => format!("/api/index-history/{}", index.slug()),
            Dataset::FundQuota => "/api/fund-quota".to_string(),
            Dataset::Etfs => "/api/etfs".to_string(),
            Dataset::LeveragedEtfs => "/api/etfs/leveraged".to_string(),
        }
    }
}

impl Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dataset::Constituents(index) => write!(f, "constituents:{}", index.slug()),
            Dataset::IndexHistory(index) => write!(f, "index-history:{}", index.slug()),
            Dataset::FundQuota => write!(f, "fund-quota"),
            Dataset::Etfs => write!(f, "etfs"),
            Dataset::LeveragedEtfs => write!(f, "etfs:leveraged"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub dataset: Dataset,
    pub filters: BTreeMap<String, String>,
}

impl RecordQuery {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_filters(mut self, filters: &BTreeMap<String, String>) -> Self {
        self.filters = filters.clone();
        self
    }

    /// Stable identity of the query, filters included.
    pub fn cache_key(&self) -> String {
        let mut key = self.dataset.to_string();
        for (k, v) in &self.filters {
            key.push_str(&format!("|{k}={v}"));
        }
        key
    }
}

#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<Record>>;
}

#[async_trait]
pub trait ChartProvider: Send + Sync {
    async fn fetch_intraday(&self, symbol: &str, interval: BarInterval) -> Result<ChartSeries>;
}
