//! Index metadata and derived market statistics

use crate::core::record::{Record, parse_numeric};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

/// The "Magnificent 7" symbols charted together.
pub const MAG7_SYMBOLS: [&str; 7] = ["AAPL", "MSFT", "GOOGL", "AMZN", "META", "NVDA", "TSLA"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Nasdaq100,
    Sp500,
    Dow,
}

impl IndexKind {
    pub fn slug(&self) -> &'static str {
        match self {
            IndexKind::Nasdaq100 => "nasdaq100",
            IndexKind::Sp500 => "sp500",
            IndexKind::Dow => "dow",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            IndexKind::Nasdaq100 => "Nasdaq 100",
            IndexKind::Sp500 => "S&P 500",
            IndexKind::Dow => "Dow Jones",
        }
    }

    /// Constituent count as of the last rebalance; share classes such as
    /// GOOG/GOOGL push the first two above the nominal size.
    pub fn expected_count(&self) -> usize {
        match self {
            IndexKind::Nasdaq100 => 101,
            IndexKind::Sp500 => 503,
            IndexKind::Dow => 30,
        }
    }
}

impl Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for IndexKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' ', '&'], "").as_str() {
            "nasdaq100" | "ndx" | "nasdaq" => Ok(IndexKind::Nasdaq100),
            "sp500" | "spx" | "sp" => Ok(IndexKind::Sp500),
            "dow" | "dowjones" | "dji" => Ok(IndexKind::Dow),
            _ => Err(anyhow::anyhow!("Invalid index: {}", s)),
        }
    }
}

pub const PRICE_KEY: &str = "price";
pub const ATH_PRICE_KEY: &str = "ath_price";
pub const ATH_CHANGE_KEY: &str = "ath_change";

/// Adds `ath_change`, the percentage distance of `price` from `ath_price`,
/// to rows that carry both.
pub fn annotate_ath_drawdown(records: &mut [Record]) {
    for record in records.iter_mut() {
        let (Some(price), Some(ath)) = (record.number(PRICE_KEY), record.number(ATH_PRICE_KEY))
        else {
            continue;
        };
        if ath > 0.0 {
            record.insert(ATH_CHANGE_KEY, (price - ath) / ath * 100.0);
        }
    }
}

pub const DATE_KEY: &str = "date";
pub const CLOSE_KEY: &str = "close";

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Calendar-year returns from monthly index closes.
///
/// Rows need a `date` (`YYYY-MM-DD`, time suffixes ignored) and a `close`;
/// others are skipped. Each year runs from its earliest to its latest close
/// and needs at least two of them. Output rows carry `year`, `return` (%),
/// `start_price`, `end_price`, `start_date` and `end_date`, oldest year first.
pub fn yearly_returns(monthly: &[Record]) -> Vec<Record> {
    let mut by_year: BTreeMap<i32, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for record in monthly {
        let date = record
            .text(DATE_KEY)
            .and_then(|d| d.get(..10))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let (Some(date), Some(close)) = (date, record.number(CLOSE_KEY)) else {
            continue;
        };
        by_year.entry(date.year()).or_default().push((date, close));
    }

    by_year
        .into_iter()
        .filter_map(|(year, mut closes)| {
            if closes.len() < 2 {
                return None;
            }
            closes.sort_by_key(|(date, _)| *date);
            let (start_date, start) = closes.first().copied()?;
            let (end_date, end) = closes.last().copied()?;
            if start == 0.0 {
                return None;
            }
            Some(
                Record::new()
                    .with("year", year.to_string())
                    .with("return", round2((end - start) / start * 100.0))
                    .with("start_price", round2(start))
                    .with("end_price", round2(end))
                    .with("start_date", start_date.format("%Y-%m-%d").to_string())
                    .with("end_date", end_date.format("%Y-%m-%d").to_string()),
            )
        })
        .collect()
}

pub const AUM_KEY: &str = "aum";
pub const ASSET_CLASS_KEY: &str = "assetClass";
pub const LEVERAGE_KEY: &str = "etfLeverage";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub count: usize,
    pub aum: f64,
}

impl Bucket {
    fn add(&mut self, aum: f64) {
        self.count += 1;
        self.aum += aum;
    }
}

/// ETF universe broken down by asset class.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarketStats {
    pub total: Bucket,
    pub by_asset_class: BTreeMap<String, Bucket>,
}

impl MarketStats {
    pub fn from_records(records: &[Record]) -> Self {
        let mut stats = MarketStats::default();
        for record in records {
            let aum = record.number(AUM_KEY).unwrap_or(0.0);
            let class = record
                .text(ASSET_CLASS_KEY)
                .filter(|c| !c.trim().is_empty())
                .unwrap_or("Other")
                .to_string();
            stats.total.add(aum);
            stats.by_asset_class.entry(class).or_default().add(aum);
        }
        stats
    }

    /// Asset classes ordered by AUM, largest first.
    pub fn ranked(&self) -> Vec<(&str, &Bucket)> {
        let mut ranked: Vec<_> = self
            .by_asset_class
            .iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        ranked.sort_by(|a, b| b.1.aum.total_cmp(&a.1.aum));
        ranked
    }
}

/// Parses leverage labels such as `"2x"`, `"-3X"` or `"1.5x"`.
pub fn parse_leverage(label: &str) -> Option<f64> {
    let trimmed = label.trim().trim_end_matches(['x', 'X']);
    parse_numeric(trimmed).filter(|f| *f != 0.0)
}

/// Leveraged and inverse ETFs grouped by leverage factor.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LeverageStats {
    pub long: Bucket,
    pub inverse: Bucket,
    /// Keyed by the normalised label, e.g. `"2x"`, `"-1x"`.
    pub by_factor: BTreeMap<String, Bucket>,
}

impl LeverageStats {
    pub fn from_records(records: &[Record]) -> Self {
        let mut stats = LeverageStats::default();
        for record in records {
            let Some(factor) = record.text(LEVERAGE_KEY).and_then(parse_leverage) else {
                continue;
            };
            // Plain 1x long funds are not leveraged products
            if factor == 1.0 {
                continue;
            }
            let aum = record.number(AUM_KEY).unwrap_or(0.0);
            if factor < 0.0 {
                stats.inverse.add(aum);
            } else {
                stats.long.add(aum);
            }
            stats
                .by_factor
                .entry(format!("{factor}x"))
                .or_default()
                .add(aum);
        }
        stats
    }
}
