//! Intraday trading-session windowing
//!
//! Intraday chart feeds return a lookback window that usually spans more
//! than one exchange day (pre/post market noise, a fresh session that only
//! has a handful of bars, UTC vs exchange-time boundaries). [`SessionWindow`]
//! picks the single most recent session that is complete enough to chart.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

/// Exchange timezone used to bucket samples into trading days.
pub const REFERENCE_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Minimum sample count for a one-minute-bar day to count as a session.
pub const ONE_MINUTE_SESSION_FLOOR: usize = 50;

/// Minutes in a regular NYSE/Nasdaq session (09:30-16:00).
const REGULAR_SESSION_MINUTES: usize = 390;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "2m")]
    TwoMinutes,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
}

impl BarInterval {
    pub fn minutes(&self) -> usize {
        match self {
            BarInterval::OneMinute => 1,
            BarInterval::TwoMinutes => 2,
            BarInterval::FiveMinutes => 5,
            BarInterval::FifteenMinutes => 15,
            BarInterval::ThirtyMinutes => 30,
            BarInterval::SixtyMinutes => 60,
        }
    }

    /// Bars in a full regular session.
    pub fn expected_bars(&self) -> usize {
        REGULAR_SESSION_MINUTES / self.minutes()
    }

    /// Session floor scaled to the bar size; one-minute bars give
    /// [`ONE_MINUTE_SESSION_FLOOR`].
    pub fn session_floor(&self) -> usize {
        let scaled = self.expected_bars() * ONE_MINUTE_SESSION_FLOOR / REGULAR_SESSION_MINUTES;
        scaled.max(1)
    }
}

impl Display for BarInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

impl FromStr for BarInterval {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" => Ok(BarInterval::OneMinute),
            "2m" => Ok(BarInterval::TwoMinutes),
            "5m" => Ok(BarInterval::FiveMinutes),
            "15m" => Ok(BarInterval::FifteenMinutes),
            "30m" => Ok(BarInterval::ThirtyMinutes),
            "60m" | "1h" => Ok(BarInterval::SixtyMinutes),
            _ => Err(anyhow::anyhow!("Invalid bar interval: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Option<f64>,
}

/// Raw intraday series as delivered by a chart provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub points: Vec<PricePoint>,
    pub previous_close: Option<f64>,
    pub currency: Option<String>,
    pub short_name: Option<String>,
}

impl ChartSeries {
    pub fn new(points: Vec<PricePoint>, previous_close: Option<f64>) -> Self {
        Self {
            points,
            previous_close,
            ..Default::default()
        }
    }

    /// Builds a series from parallel `dates`/`prices` arrays where dates are
    /// exchange-local strings. Entries whose date cannot be parsed are
    /// skipped; extra entries on either side are ignored.
    pub fn from_parallel(
        dates: &[String],
        prices: &[Option<f64>],
        previous_close: Option<f64>,
        timezone: Tz,
    ) -> Self {
        let points = dates
            .iter()
            .zip(prices)
            .filter_map(|(date, price)| match parse_local_timestamp(date, timezone) {
                Some(timestamp) => Some(PricePoint {
                    timestamp,
                    price: *price,
                }),
                None => {
                    debug!("Skipping unparseable chart timestamp: {}", date);
                    None
                }
            })
            .collect();
        Self::new(points, previous_close)
    }
}

/// Parses RFC 3339 timestamps, or naive `YYYY-MM-DD HH:MM[:SS]` timestamps
/// interpreted in `timezone`. Ambiguous fall-back times resolve to the earlier
/// instant; times skipped by a spring-forward gap keep the pre-gap offset.
pub fn parse_local_timestamp(s: &str, timezone: Tz) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|naive| resolve_local(naive, timezone))
        .map(|dt| dt.with_timezone(&Utc))
}

fn resolve_local(naive: NaiveDateTime, timezone: Tz) -> Option<DateTime<Tz>> {
    timezone.from_local_datetime(&naive).earliest().or_else(|| {
        // Inside a DST gap: the wall clock jumped an hour ahead
        timezone
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest()
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionPoint {
    pub timestamp: DateTime<Tz>,
    pub price: f64,
}

/// One exchange day of samples in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct TradingSession {
    pub date: Option<NaiveDate>,
    pub points: Vec<SessionPoint>,
    pub previous_close: Option<f64>,
}

impl TradingSession {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn open(&self) -> Option<f64> {
        self.points.first().map(|p| p.price)
    }

    pub fn last(&self) -> Option<f64> {
        self.points.last().map(|p| p.price)
    }

    pub fn high(&self) -> Option<f64> {
        self.points.iter().map(|p| p.price).reduce(f64::max)
    }

    pub fn low(&self) -> Option<f64> {
        self.points.iter().map(|p| p.price).reduce(f64::min)
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Absolute change of the last price against the previous close.
    pub fn change(&self) -> Option<f64> {
        Some(self.last()? - self.previous_close?)
    }

    /// Percentage change of the last price against the previous close.
    pub fn change_percent(&self) -> Option<f64> {
        let prev = self.previous_close.filter(|p| *p > 0.0)?;
        Some((self.last()? - prev) / prev * 100.0)
    }
}

/// Session selection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionWindow {
    pub timezone: Tz,
    /// A day qualifies when it has strictly more samples than this.
    pub floor: usize,
}

impl Default for SessionWindow {
    fn default() -> Self {
        Self {
            timezone: REFERENCE_TIMEZONE,
            floor: ONE_MINUTE_SESSION_FLOOR,
        }
    }
}

impl SessionWindow {
    pub fn for_interval(interval: BarInterval) -> Self {
        Self {
            floor: interval.session_floor(),
            ..Default::default()
        }
    }

    pub fn with_floor(mut self, floor: usize) -> Self {
        self.floor = floor;
        self
    }

    pub fn window(&self, series: &ChartSeries) -> TradingSession {
        let mut days: BTreeMap<NaiveDate, Vec<SessionPoint>> = BTreeMap::new();
        for point in &series.points {
            let Some(price) = point.price.filter(|p| p.is_finite()) else {
                continue;
            };
            let timestamp = point.timestamp.with_timezone(&self.timezone);
            days.entry(timestamp.date_naive())
                .or_default()
                .push(SessionPoint { timestamp, price });
        }

        let selected = days
            .iter()
            .rev()
            .find(|(_, points)| points.len() > self.floor)
            .or_else(|| {
                // Most recent date wins ties: the reverse walk keeps the first maximum
                days.iter().rev().fold(None, |best, day| match best {
                    Some((_, best_points)) if best_points.len() >= day.1.len() => best,
                    _ => Some(day),
                })
            })
            .map(|(date, _)| *date);

        let Some(date) = selected else {
            debug!("No priced samples in chart series");
            return TradingSession {
                date: None,
                points: Vec::new(),
                previous_close: series.previous_close,
            };
        };

        let mut points = days.remove(&date).unwrap_or_default();
        points.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        debug!(%date, samples = points.len(), candidates = days.len() + 1, "Selected trading session");

        TradingSession {
            date: Some(date),
            points,
            previous_close: series.previous_close,
        }
    }
}

/// Windows `series` with the default one-minute policy in US Eastern time.
pub fn window_session(series: &ChartSeries) -> TradingSession {
    SessionWindow::default().window(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn eastern(date: &str, hour: u32, minute: u32) -> DateTime<Utc> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        REFERENCE_TIMEZONE
            .from_local_datetime(&day.and_hms_opt(hour, minute, 0).unwrap())
            .unwrap()
            .with_timezone(&Utc)
    }

    /// `count` one-minute bars starting 09:30 Eastern on `date`.
    fn bars(date: &str, count: usize, base_price: f64) -> Vec<PricePoint> {
        let open = eastern(date, 9, 30);
        (0..count)
            .map(|i| PricePoint {
                timestamp: open + Duration::minutes(i as i64),
                price: Some(base_price + i as f64 * 0.01),
            })
            .collect()
    }

    fn assert_chronological(session: &TradingSession) {
        assert!(
            session
                .points
                .windows(2)
                .all(|w| w[0].timestamp <= w[1].timestamp)
        );
    }

    #[test]
    fn test_single_clean_day() {
        let mut points = bars("2024-03-05", 390, 100.0);
        points.reverse();
        let series = ChartSeries::new(points, Some(99.5));

        let session = window_session(&series);
        assert_eq!(session.len(), 390);
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(session.previous_close, Some(99.5));
        assert_chronological(&session);
        assert_eq!(session.open(), Some(100.0));
    }

    #[test]
    fn test_partial_current_day_is_skipped() {
        let mut points = bars("2024-03-05", 400, 100.0);
        points.extend(bars("2024-03-06", 15, 105.0));
        let series = ChartSeries::new(points, Some(98.0));

        let session = window_session(&series);
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(session.len(), 400);
        assert_chronological(&session);
    }

    #[test]
    fn test_most_recent_qualifying_day_wins_over_larger_one() {
        let mut points = bars("2024-03-04", 390, 100.0);
        points.extend(bars("2024-03-05", 120, 101.0));
        let series = ChartSeries::new(points, None);

        let session = window_session(&series);
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(session.len(), 120);
    }

    #[test]
    fn test_sparse_days_fall_back_to_largest() {
        let mut points = bars("2024-03-06", 10, 100.0);
        points.extend(bars("2024-03-05", 5, 100.0));
        let series = ChartSeries::new(points, Some(100.0));

        let session = window_session(&series);
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 6));
        assert_eq!(session.len(), 10);
    }

    #[test]
    fn test_sparse_tie_prefers_most_recent() {
        let mut points = bars("2024-03-05", 7, 100.0);
        points.extend(bars("2024-03-06", 7, 100.0));
        let session = window_session(&ChartSeries::new(points, None));
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 6));
    }

    #[test]
    fn test_floor_is_strict() {
        let session = window_session(&ChartSeries::new(
            [bars("2024-03-05", 51, 1.0), bars("2024-03-06", 50, 1.0)].concat(),
            None,
        ));
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 5));
    }

    #[test]
    fn test_null_prices_are_dropped_and_not_counted() {
        // 60 bars on the latest day, but only 40 carry a price
        let mut latest = bars("2024-03-06", 60, 100.0);
        for point in latest.iter_mut().take(20) {
            point.price = None;
        }
        let mut points = bars("2024-03-05", 390, 100.0);
        points.extend(latest);

        let session = window_session(&ChartSeries::new(points, Some(1.0)));
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 5));

        let mut only_latest = bars("2024-03-06", 5, 100.0);
        only_latest[2].price = None;
        let session = window_session(&ChartSeries::new(only_latest, None));
        assert_eq!(session.len(), 4);
        assert!(session.points.iter().all(|p| p.price.is_finite()));
    }

    #[test]
    fn test_empty_and_all_null_series() {
        let session = window_session(&ChartSeries::new(Vec::new(), Some(42.0)));
        assert!(session.is_empty());
        assert_eq!(session.date, None);
        assert_eq!(session.previous_close, Some(42.0));

        let mut points = bars("2024-03-05", 10, 1.0);
        points.iter_mut().for_each(|p| p.price = None);
        let session = window_session(&ChartSeries::new(points, None));
        assert!(session.is_empty());
        assert_eq!(session.previous_close, None);
        assert_eq!(session.change_percent(), None);
    }

    #[test]
    fn test_days_are_bucketed_in_eastern_time() {
        // 23:30 Eastern is already the next day in UTC
        let late = eastern("2024-03-05", 23, 30);
        let points = vec![PricePoint {
            timestamp: late,
            price: Some(10.0),
        }];
        let session = window_session(&ChartSeries::new(points, None));
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(session.points[0].timestamp.timezone(), REFERENCE_TIMEZONE);
    }

    #[test]
    fn test_local_timestamps_across_dst_transitions() {
        let gap = parse_local_timestamp("2024-03-10 02:30", REFERENCE_TIMEZONE);
        assert_eq!(gap, Utc.with_ymd_and_hms(2024, 3, 10, 7, 30, 0).single());

        let ambiguous = parse_local_timestamp("2024-11-03 01:30:00", REFERENCE_TIMEZONE);
        assert_eq!(ambiguous, Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).single());

        let series = ChartSeries::from_parallel(
            &["2024-03-10 01:59".to_string(), "2024-03-10 02:30".to_string()],
            &[Some(1.0), Some(2.0)],
            None,
            REFERENCE_TIMEZONE,
        );
        assert_eq!(series.points.len(), 2);
    }

    #[test]
    fn test_session_summary() {
        let series = ChartSeries::new(bars("2024-03-05", 100, 100.0), Some(99.0));
        let session = window_session(&series);
        assert_eq!(session.open(), Some(100.0));
        assert!((session.last().unwrap() - 100.99).abs() < 1e-9);
        assert!((session.high().unwrap() - 100.99).abs() < 1e-9);
        assert_eq!(session.low(), Some(100.0));
        assert!((session.change().unwrap() - 1.99).abs() < 1e-9);
        assert!((session.change_percent().unwrap() - 1.99 / 99.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_interval_floor() {
        assert_eq!(BarInterval::OneMinute.session_floor(), 50);
        assert_eq!(BarInterval::FiveMinutes.session_floor(), 10);
        assert_eq!(BarInterval::SixtyMinutes.session_floor(), 1);
        assert_eq!(SessionWindow::for_interval(BarInterval::OneMinute), SessionWindow::default());
        assert_eq!("5M".parse::<BarInterval>().unwrap(), BarInterval::FiveMinutes);
        assert_eq!("1h".parse::<BarInterval>().unwrap(), BarInterval::SixtyMinutes);
        assert!("3m".parse::<BarInterval>().is_err());
        assert_eq!(BarInterval::FifteenMinutes.to_string(), "15m");
    }

    #[test]
    fn test_from_parallel_arrays() {
        let dates = vec![
            "2024-03-05 09:30:00".to_string(),
            "2024-03-05T09:31:00".to_string(),
            "not a date".to_string(),
            "2024-03-05T14:32:00Z".to_string(),
        ];
        let prices = vec![Some(1.0), None, Some(3.0), Some(4.0)];
        let series = ChartSeries::from_parallel(&dates, &prices, Some(0.5), REFERENCE_TIMEZONE);

        assert_eq!(series.points.len(), 3);
        assert_eq!(series.points[0].timestamp, eastern("2024-03-05", 9, 30));
        assert_eq!(series.points[1].price, None);
        // 14:32 UTC is 09:32 EST
        assert_eq!(series.points[2].timestamp, eastern("2024-03-05", 9, 32));
        assert_eq!(series.previous_close, Some(0.5));

        let session = window_session(&series);
        assert_eq!(session.len(), 2);
    }
}
