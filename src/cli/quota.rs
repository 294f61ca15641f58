use super::list::{self, Column, ColumnFormat, ListOptions};
use crate::core::fund::normalize_quota_record;
use crate::core::i18n::Language;
use crate::core::source::{Dataset, RecordQuery, RecordSource};
use crate::core::table::{QUOTA_KEY, SortContext, SortDirection, SortState};
use crate::core::view::FetchTrigger;
use anyhow::Result;

pub const COLUMNS: [Column; 7] = [
    Column::new("fund_code", "column.fund_code", ColumnFormat::Text),
    Column::new("fund_name", "column.fund_name", ColumnFormat::Text),
    Column::new("fund_company", "column.fund_company", ColumnFormat::Text),
    Column::new("share_class", "column.share_class", ColumnFormat::Text),
    Column::new("quota", "column.quota", ColumnFormat::Number(2)),
    Column::new("currency", "column.currency", ColumnFormat::Text),
    Column::new("effective_date", "column.effective_date", ColumnFormat::Text),
];

/// QDII quota table, largest quota first with USD quotas converted at `usd_rate`.
pub async fn run(
    source: &dyn RecordSource,
    options: &ListOptions,
    page_size: usize,
    usd_rate: f64,
    language: Language,
) -> Result<()> {
    let mut view = list::new_view(
        "fund-quota",
        SortState::new(QUOTA_KEY, SortDirection::Descending),
        SortContext::FundQuota { usd_rate },
        page_size,
        options,
    );

    list::load_view(
        &mut view,
        source,
        RecordQuery::new(Dataset::FundQuota),
        FetchTrigger::Mount,
        language,
        |records| records.iter_mut().for_each(normalize_quota_record),
    )
    .await;

    list::apply_sort_options(&mut view, options);
    view.go_to_page(options.page);

    println!(
        "{}",
        list::render(&view, &language.label("title.quota"), &COLUMNS, language)
    );
    Ok(())
}
