use super::ui;
use crate::core::i18n::Language;
use crate::core::market::MAG7_SYMBOLS;
use crate::core::session::{BarInterval, ChartSeries, SessionWindow, TradingSession};
use crate::core::source::ChartProvider;
use anyhow::Result;
use comfy_table::Cell;
use futures::future::join_all;
use tracing::{debug, warn};

const DETAIL_SPARK_WIDTH: usize = 60;
const ROW_SPARK_WIDTH: usize = 30;

fn session_label(session: &TradingSession) -> String {
    session
        .date
        .map_or_else(|| ui::MISSING.to_string(), |d| d.format("%Y-%m-%d").to_string())
}

/// Summary of one symbol's latest session followed by its sparkline.
pub fn render_session(
    symbol: &str,
    series: &ChartSeries,
    session: &TradingSession,
    language: Language,
) -> String {
    let heading = match &series.short_name {
        Some(name) => format!("{} ({name})", language.chart_title(symbol)),
        None => language.chart_title(symbol),
    };
    let mut output = format!("{}\n\n", ui::style_text(&heading, ui::StyleType::Title));

    if session.is_empty() {
        output.push_str(&ui::style_text(&language.no_data(), ui::StyleType::Subtle));
        return output;
    }

    let previous_close = session.previous_close;
    let price = |value: Option<f64>| {
        value.map_or_else(ui::missing_cell, |p| ui::price_cell(p, previous_close))
    };

    let mut table = ui::new_styled_table();
    table.set_header(
        [
            "column.date",
            "column.open",
            "column.high",
            "column.low",
            "column.last",
            "column.previous_close",
            "column.change",
            "column.samples",
        ]
        .iter()
        .map(|key| ui::header_cell(&language.label(key))),
    );
    table.add_row(vec![
        Cell::new(session_label(session)),
        price(session.open()),
        price(session.high()),
        price(session.low()),
        price(session.last()),
        ui::format_optional_cell(previous_close, |p| format!("{p:.2}")),
        session
            .change_percent()
            .map_or_else(ui::missing_cell, ui::change_cell),
        Cell::new(session.len()),
    ]);

    output.push_str(&table.to_string());
    output.push_str("\n\n");
    output.push_str(&ui::sparkline(&session.prices(), DETAIL_SPARK_WIDTH));
    if let Some(currency) = &series.currency {
        output.push_str(&format!("  {}", ui::style_text(currency, ui::StyleType::Subtle)));
    }
    output
}

pub async fn run(
    symbol: &str,
    provider: &dyn ChartProvider,
    interval: BarInterval,
    window: SessionWindow,
    language: Language,
) -> Result<()> {
    let symbol = symbol.to_uppercase();
    let spinner = ui::new_spinner(language.loading());
    let result = provider.fetch_intraday(&symbol, interval).await;
    spinner.finish_and_clear();

    let series = match result {
        Ok(series) => series,
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "Chart fetch failed");
            ChartSeries::default()
        }
    };

    let session = window.window(&series);
    debug!(symbol = %symbol, date = ?session.date, samples = session.len(), "Session selected");
    println!("{}", render_session(&symbol, &series, &session, language));
    Ok(())
}

/// One row per symbol; symbols whose chart could not be loaded show "-".
pub fn render_overview(rows: &[(String, Option<TradingSession>)], language: Language) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(
        [
            "column.symbol",
            "column.last",
            "column.change",
            "column.previous_close",
            "column.samples",
            "column.trend",
        ]
        .iter()
        .map(|key| ui::header_cell(&language.label(key))),
    );

    for (symbol, session) in rows {
        let row = match session.as_ref().filter(|s| !s.is_empty()) {
            Some(session) => vec![
                Cell::new(symbol),
                session
                    .last()
                    .map_or_else(ui::missing_cell, |p| ui::price_cell(p, session.previous_close)),
                session
                    .change_percent()
                    .map_or_else(ui::missing_cell, ui::change_cell),
                ui::format_optional_cell(session.previous_close, |p| format!("{p:.2}")),
                Cell::new(session.len()),
                Cell::new(ui::sparkline(&session.prices(), ROW_SPARK_WIDTH)),
            ],
            None => {
                let mut row = vec![Cell::new(symbol)];
                row.extend((0..5).map(|_| ui::missing_cell()));
                row
            }
        };
        table.add_row(row);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(&language.label("title.mag7"), ui::StyleType::Title),
        table
    )
}

/// Magnificent 7 overview. Charts are fetched concurrently.
pub async fn run_mag7(
    provider: &dyn ChartProvider,
    interval: BarInterval,
    window: SessionWindow,
    language: Language,
) -> Result<()> {
    let pb = ui::new_progress_bar(MAG7_SYMBOLS.len() as u64, language.loading());

    let fetches = MAG7_SYMBOLS.iter().map(|symbol| {
        let pb = pb.clone();
        async move {
            let result = provider.fetch_intraday(symbol, interval).await;
            pb.inc(1);
            let session = match result {
                Ok(series) => Some(window.window(&series)),
                Err(e) => {
                    warn!(symbol, error = %e, "Chart fetch failed");
                    None
                }
            };
            (symbol.to_string(), session)
        }
    });

    let rows = join_all(fetches).await;
    pb.finish_and_clear();

    println!("{}", render_overview(&rows, language));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::PricePoint;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    fn series(prices: &[f64], previous_close: Option<f64>) -> ChartSeries {
        let start = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                timestamp: start + chrono::Duration::minutes(i as i64),
                price: Some(*p),
            })
            .collect();
        ChartSeries::new(points, previous_close)
    }

    struct StubProvider;

    #[async_trait]
    impl ChartProvider for StubProvider {
        async fn fetch_intraday(&self, symbol: &str, _interval: BarInterval) -> Result<ChartSeries> {
            match symbol {
                "TSLA" => Err(anyhow!("rate limited")),
                _ => Ok(series(&[100.0, 101.0, 102.5], Some(100.0))),
            }
        }
    }

    #[test]
    fn test_render_session() {
        let mut data = series(&[10.0, 12.0, 11.0], Some(10.0));
        data.short_name = Some("Apple Inc.".to_string());
        data.currency = Some("USD".to_string());
        let session = SessionWindow::default().window(&data);

        let output = render_session("AAPL", &data, &session, Language::English);
        assert!(output.contains("AAPL Intraday (Apple Inc.)"));
        assert!(output.contains("2024-03-05"));
        assert!(output.contains("12.00"));
        assert!(output.contains("+10.00%"));
        assert!(output.contains("▁█▅"));
        assert!(output.contains("USD"));
    }

    #[test]
    fn test_render_empty_session() {
        let data = ChartSeries::new(Vec::new(), Some(10.0));
        let session = SessionWindow::default().window(&data);
        let output = render_session("AAPL", &data, &session, Language::Chinese);
        assert!(output.contains("暂无数据"));
    }

    #[tokio::test]
    async fn test_overview_marks_failed_symbols() {
        let provider = StubProvider;
        let window = SessionWindow::for_interval(BarInterval::OneMinute);
        let mut rows = Vec::new();
        for symbol in ["AAPL", "TSLA"] {
            let session = provider
                .fetch_intraday(symbol, BarInterval::OneMinute)
                .await
                .ok()
                .map(|s| window.window(&s));
            rows.push((symbol.to_string(), session));
        }

        let output = render_overview(&rows, Language::English);
        assert!(output.contains("+2.50%"));
        let tsla_line = output.lines().find(|l| l.contains("TSLA")).unwrap();
        assert!(tsla_line.contains(ui::MISSING));
        assert!(!tsla_line.contains('%'));
    }
}
