//! Sorting and pagination of record tables

use crate::core::record::{FieldValue, Record};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

/// Conversion factor applied to USD quotas so they compare against CNY quotas.
pub const DEFAULT_USD_CNY_RATE: f64 = 7.0;

/// Field holding the fund quota amount.
pub const QUOTA_KEY: &str = "quota";
/// Field holding the quota currency code.
pub const CURRENCY_KEY: &str = "currency";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(anyhow::anyhow!("Invalid sort direction: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

/// Which table the records belong to. Some tables compare certain keys with
/// domain rules instead of the generic value ordering.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SortContext {
    #[default]
    General,
    /// QDII quota table; `quota` is compared after converting USD quotas
    /// with `usd_rate`.
    FundQuota { usd_rate: f64 },
}

/// Quota expressed in CNY-equivalent units.
pub fn normalized_quota(record: &Record, usd_rate: f64) -> f64 {
    let quota = record.number(QUOTA_KEY).unwrap_or(0.0);
    if record.text(CURRENCY_KEY) == Some("USD") {
        quota * usd_rate
    } else {
        quota
    }
}

// Numeric values (including null, booleans and numeric strings) order before
// free text; null reads as zero.
enum SortValue<'a> {
    Numeric(f64),
    Text(&'a str),
}

impl<'a> SortValue<'a> {
    fn of(value: Option<&'a FieldValue>) -> Self {
        match value {
            None | Some(FieldValue::Null) => SortValue::Numeric(0.0),
            Some(FieldValue::Bool(b)) => SortValue::Numeric(if *b { 1.0 } else { 0.0 }),
            Some(FieldValue::Number(n)) => SortValue::Numeric(*n),
            Some(FieldValue::Text(s)) => match value.and_then(FieldValue::as_number) {
                Some(n) => SortValue::Numeric(n),
                None => SortValue::Text(s),
            },
        }
    }
}

fn compare_numbers(a: f64, b: f64) -> Ordering {
    // `+ 0.0` folds -0.0 into 0.0 so total_cmp treats them as equal
    (a + 0.0).total_cmp(&(b + 0.0))
}

/// Case-insensitive ordering with an exact comparison as tie-break.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Ascending comparison of two records on `key`.
pub fn compare_records(a: &Record, b: &Record, key: &str, context: SortContext) -> Ordering {
    if let SortContext::FundQuota { usd_rate } = context {
        if key == QUOTA_KEY {
            return compare_numbers(normalized_quota(a, usd_rate), normalized_quota(b, usd_rate));
        }
    }

    match (SortValue::of(a.get(key)), SortValue::of(b.get(key))) {
        (SortValue::Text(x), SortValue::Text(y)) => collate(x, y),
        (SortValue::Numeric(x), SortValue::Numeric(y)) => compare_numbers(x, y),
        (SortValue::Numeric(_), SortValue::Text(_)) => Ordering::Less,
        (SortValue::Text(_), SortValue::Numeric(_)) => Ordering::Greater,
    }
}

/// Returns a new, stably sorted copy of `records`.
pub fn sort_records(records: &[Record], sort: &SortState, context: SortContext) -> Vec<Record> {
    let mut sorted = records.to_vec();
    sort_in_place(&mut sorted, sort, context);
    sorted
}

pub(crate) fn sort_in_place(records: &mut [Record], sort: &SortState, context: SortContext) {
    records.sort_by(|a, b| sort.direction.apply(compare_records(a, b, &sort.key, context)));
}

/// Slice of the 1-based `page`. Pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page_size == 0 {
        return &[];
    }
    let start = page.saturating_sub(1).saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        len.div_ceil(page_size)
    }
}
