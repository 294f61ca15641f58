use super::list::{self, Column, ColumnFormat, ListOptions};
use crate::core::i18n::Language;
use crate::core::market::{IndexKind, annotate_ath_drawdown};
use crate::core::source::{Dataset, RecordQuery, RecordSource};
use crate::core::table::{SortContext, SortDirection, SortState};
use crate::core::view::FetchTrigger;
use anyhow::Result;
use tracing::{info, warn};

pub const COLUMNS: [Column; 10] = [
    Column::new("rank", "column.rank", ColumnFormat::Number(0)),
    Column::new("symbol", "column.symbol", ColumnFormat::Text),
    Column::new("name", "column.name", ColumnFormat::Text),
    Column::new("sector", "column.sector", ColumnFormat::Text),
    Column::new("weight", "column.weight", ColumnFormat::Percent),
    Column::new("price", "column.price", ColumnFormat::Number(2)),
    Column::new("change", "column.change", ColumnFormat::Change),
    Column::new("ath_price", "column.ath_price", ColumnFormat::Number(2)),
    Column::new("ath_change", "column.ath_change", ColumnFormat::Change),
    Column::new("pe_ratio", "column.pe_ratio", ColumnFormat::Number(2)),
];

pub async fn run(
    index: IndexKind,
    source: &dyn RecordSource,
    options: &ListOptions,
    page_size: usize,
    language: Language,
) -> Result<()> {
    let mut view = list::new_view(
        index.slug(),
        SortState::new("weight", SortDirection::Descending),
        SortContext::General,
        page_size,
        options,
    );

    list::load_view(
        &mut view,
        source,
        RecordQuery::new(Dataset::Constituents(index)),
        FetchTrigger::Mount,
        language,
        |records| {
            // Filtered queries return subsets, so only the full listing is checked
            if options.filters.is_empty() && records.len() != index.expected_count() {
                warn!(
                    index = index.slug(),
                    expected = index.expected_count(),
                    actual = records.len(),
                    "Unexpected constituent count"
                );
            }
            annotate_ath_drawdown(records);
        },
    )
    .await;

    list::apply_sort_options(&mut view, options);
    view.go_to_page(options.page);
    info!(index = index.slug(), count = view.records().len(), "Constituents loaded");

    let title = language.constituents_title(index.display_name());
    println!("{}", list::render(&view, &title, &COLUMNS, language));
    Ok(())
}
