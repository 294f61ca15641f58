use super::list::{self, Column, ColumnFormat, ListOptions};
use crate::core::i18n::Language;
use crate::core::market::{IndexKind, yearly_returns};
use crate::core::source::{Dataset, RecordQuery, RecordSource};
use crate::core::table::{SortContext, SortDirection, SortState};
use crate::core::view::{FetchTrigger, ListView};
use anyhow::Result;
use tracing::info;

pub const COLUMNS: [Column; 6] = [
    Column::new("year", "column.year", ColumnFormat::Text),
    Column::new("return", "column.return", ColumnFormat::Change),
    Column::new("start_price", "column.start_price", ColumnFormat::Number(2)),
    Column::new("end_price", "column.end_price", ColumnFormat::Number(2)),
    Column::new("start_date", "column.start_date", ColumnFormat::Text),
    Column::new("end_date", "column.end_date", ColumnFormat::Text),
];

/// Fetches monthly closes for `index` and reduces them to one row per year.
pub async fn load(
    index: IndexKind,
    source: &dyn RecordSource,
    options: &ListOptions,
    page_size: usize,
    language: Language,
) -> ListView {
    let mut view = list::new_view(
        &format!("history:{}", index.slug()),
        SortState::new("year", SortDirection::Descending),
        SortContext::General,
        page_size,
        options,
    );

    list::load_view(
        &mut view,
        source,
        RecordQuery::new(Dataset::IndexHistory(index)),
        FetchTrigger::Mount,
        language,
        |records| {
            let months = records.len();
            *records = yearly_returns(records);
            info!(index = index.slug(), months, years = records.len(), "Yearly returns computed");
        },
    )
    .await;

    list::apply_sort_options(&mut view, options);
    view.go_to_page(options.page);
    view
}

pub async fn run(
    index: IndexKind,
    source: &dyn RecordSource,
    options: &ListOptions,
    page_size: usize,
    language: Language,
) -> Result<()> {
    let view = load(index, source, options, page_size, language).await;
    let title = language.history_title(index.display_name());
    println!("{}", list::render(&view, &title, &COLUMNS, language));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::record::Record;
    use crate::core::view::ViewState;
    use async_trait::async_trait;

    struct MonthlySource;

    #[async_trait]
    impl RecordSource for MonthlySource {
        async fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<Record>> {
            assert_eq!(query.dataset, Dataset::IndexHistory(IndexKind::Nasdaq100));
            Ok(["2022-01-01", "2022-12-01", "2023-01-01", "2023-12-01", "2024-01-01"]
                .iter()
                .zip([100.0, 50.0, 50.0, 100.0, 110.0])
                .map(|(date, close)| Record::new().with("date", *date).with("close", close))
                .collect())
        }
    }

    #[tokio::test]
    async fn test_history_lists_latest_year_first() {
        let view = load(
            IndexKind::Nasdaq100,
            &MonthlySource,
            &ListOptions::default(),
            20,
            Language::English,
        )
        .await;

        assert_eq!(view.state(), ViewState::Loaded);
        assert_eq!(view.records().len(), 2);
        assert_eq!(view.records()[0].text("year"), Some("2023"));
        assert_eq!(view.records()[0].number("return"), Some(100.0));
        assert_eq!(view.records()[1].number("return"), Some(-50.0));

        let output = list::render(&view, "NDX", &COLUMNS, Language::English);
        assert!(output.contains("Sorted by Year (desc)"));
        assert!(output.contains("2023-12-01"));
    }
}
