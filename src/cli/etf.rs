use super::list::{self, Column, ColumnFormat, ListOptions};
use super::ui;
use crate::core::i18n::Language;
use crate::core::market::{AUM_KEY, LeverageStats, MarketStats};
use crate::core::source::{Dataset, RecordQuery, RecordSource};
use crate::core::table::{SortContext, SortDirection, SortState};
use crate::core::view::FetchTrigger;
use anyhow::Result;
use comfy_table::{Cell, CellAlignment};
use tracing::warn;

pub const COLUMNS: [Column; 9] = [
    Column::new("ticker", "column.ticker", ColumnFormat::Text),
    Column::new("issuer", "column.issuer", ColumnFormat::Text),
    Column::new("assetClass", "column.asset_class", ColumnFormat::Text),
    Column::new("aum", "column.aum", ColumnFormat::Compact),
    Column::new("expenseRatio", "column.expense_ratio", ColumnFormat::Percent),
    Column::new("etfLeverage", "column.leverage", ColumnFormat::Text),
    Column::new("price", "column.price", ColumnFormat::Number(2)),
    Column::new("ch1m", "column.ch1m", ColumnFormat::Change),
    Column::new("ch1y", "column.ch1y", ColumnFormat::Change),
];

fn count_cell(count: usize) -> Cell {
    Cell::new(count).set_alignment(CellAlignment::Right)
}

fn aum_cell(aum: f64) -> Cell {
    Cell::new(ui::format_compact(aum)).set_alignment(CellAlignment::Right)
}

pub fn render_market_stats(stats: &MarketStats, language: Language) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(&language.label("column.asset_class")),
        ui::header_cell(&language.label("column.count")),
        ui::header_cell(&language.label("column.aum")),
    ]);

    for (class, bucket) in stats.ranked() {
        table.add_row(vec![
            Cell::new(class),
            count_cell(bucket.count),
            aum_cell(bucket.aum),
        ]);
    }
    table.add_row(vec![
        Cell::new(ui::style_text(&language.label("stats.total"), ui::StyleType::Label)),
        count_cell(stats.total.count),
        aum_cell(stats.total.aum),
    ]);

    format!(
        "{}\n\n{}",
        ui::style_text(&language.label("title.market_stats"), ui::StyleType::Title),
        table
    )
}

pub fn render_leverage_stats(stats: &LeverageStats, language: Language) -> String {
    let title = ui::style_text(&language.label("title.leverage_stats"), ui::StyleType::Title);
    if stats.by_factor.is_empty() {
        return format!("{title}\n\n{}", ui::style_text(&language.no_data(), ui::StyleType::Subtle));
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(&language.label("column.factor")),
        ui::header_cell(&language.label("column.count")),
        ui::header_cell(&language.label("column.aum")),
    ]);

    let mut factors: Vec<_> = stats.by_factor.iter().collect();
    factors.sort_by(|a, b| b.1.aum.total_cmp(&a.1.aum));
    for (factor, bucket) in factors {
        table.add_row(vec![
            Cell::new(factor),
            count_cell(bucket.count),
            aum_cell(bucket.aum),
        ]);
    }
    for (label, bucket) in [("stats.long", &stats.long), ("stats.inverse", &stats.inverse)] {
        table.add_row(vec![
            Cell::new(ui::style_text(&language.label(label), ui::StyleType::Label)),
            count_cell(bucket.count),
            aum_cell(bucket.aum),
        ]);
    }

    format!("{title}\n\n{table}")
}

/// ETF screener page with market and leverage overviews. The listing and the
/// leveraged dataset are fetched concurrently.
pub async fn run(
    source: &dyn RecordSource,
    options: &ListOptions,
    page_size: usize,
    language: Language,
) -> Result<()> {
    let mut view = list::new_view(
        "etfs",
        SortState::new(AUM_KEY, SortDirection::Descending),
        SortContext::General,
        page_size,
        options,
    );

    let leveraged_query = RecordQuery::new(Dataset::LeveragedEtfs);
    let (_, leveraged) = futures::join!(
        list::load_view(
            &mut view,
            source,
            RecordQuery::new(Dataset::Etfs),
            FetchTrigger::Mount,
            language,
            |_| {},
        ),
        source.fetch_records(&leveraged_query)
    );

    list::apply_sort_options(&mut view, options);
    view.go_to_page(options.page);

    let market = MarketStats::from_records(view.records());
    let leverage = match leveraged {
        Ok(records) => LeverageStats::from_records(&records),
        Err(e) => {
            warn!(error = %e, "Leveraged ETF fetch failed");
            LeverageStats::default()
        }
    };

    println!(
        "{}",
        list::render(&view, &language.label("title.etf"), &COLUMNS, language)
    );
    ui::print_separator();
    println!("{}", render_market_stats(&market, language));
    ui::print_separator();
    println!("{}", render_leverage_stats(&leverage, language));
    Ok(())
}
