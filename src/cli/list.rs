//! Shared rendering and loading for the tabular pages.

use super::ui;
use crate::core::i18n::Language;
use crate::core::record::{FieldValue, Record};
use crate::core::source::{RecordQuery, RecordSource};
use crate::core::table::{SortContext, SortDirection, SortState};
use crate::core::view::{FetchTrigger, ListView, ViewState};
use anyhow::{Result, anyhow};
use comfy_table::{Cell, CellAlignment};
use tracing::debug;

/// How a column renders its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnFormat {
    Text,
    /// Fixed decimals.
    Number(usize),
    /// Signed percentage with green/red colouring.
    Change,
    /// Plain percentage.
    Percent,
    /// Abbreviated amount (K/M/B/T).
    Compact,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    /// Locale key of the header label.
    pub label: &'static str,
    pub format: ColumnFormat,
}

impl Column {
    pub const fn new(key: &'static str, label: &'static str, format: ColumnFormat) -> Self {
        Self { key, label, format }
    }

    pub fn cell(&self, record: &Record) -> Cell {
        let Some(value) = record.get(self.key).filter(|v| !v.is_null()) else {
            return ui::missing_cell();
        };
        match self.format {
            ColumnFormat::Text => text_cell(value),
            ColumnFormat::Number(decimals) => numeric_cell(value, |n| format!("{n:.decimals$}")),
            ColumnFormat::Percent => numeric_cell(value, |n| format!("{n:.2}%")),
            ColumnFormat::Compact => numeric_cell(value, ui::format_compact),
            ColumnFormat::Change => match value.as_number() {
                Some(n) => ui::change_cell(n),
                None => text_cell(value),
            },
        }
    }
}

fn text_cell(value: &FieldValue) -> Cell {
    let text = value.to_string();
    if text == ui::MISSING {
        ui::missing_cell()
    } else {
        Cell::new(text)
    }
}

/// Numbers are formatted; anything else is shown as delivered.
fn numeric_cell(value: &FieldValue, format_fn: impl Fn(f64) -> String) -> Cell {
    match value.as_number() {
        Some(n) => Cell::new(format_fn(n)).set_alignment(CellAlignment::Right),
        None => text_cell(value),
    }
}

/// Sort, paging and filter choices given on the command line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListOptions {
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
    /// 1-based; 0 is treated as the first page.
    pub page: usize,
    pub filters: Vec<(String, String)>,
}

/// Parses a `key=value` filter argument.
pub fn parse_filter(arg: &str) -> Result<(String, String)> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Invalid filter '{}', expected key=value", arg))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("Invalid filter '{}', key is empty", arg));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Applies explicit sort options on top of the page's default order.
pub fn apply_sort_options(view: &mut ListView, options: &ListOptions) {
    match (&options.sort, options.direction) {
        (Some(key), Some(direction)) => view.set_sort(SortState::new(key.as_str(), direction)),
        (Some(key), None) if *key != view.sort().key => view.sort_by(key),
        (Some(_), None) => {}
        (None, Some(direction)) => {
            let key = view.sort().key.clone();
            view.set_sort(SortState::new(key, direction));
        }
        (None, None) => {}
    }
}

/// Fetches the dataset for the view's filters and applies the result.
///
/// `prepare` runs on fetched rows before they reach the view. Failures
/// leave the view empty.
pub async fn load_view(
    view: &mut ListView,
    source: &dyn RecordSource,
    query: RecordQuery,
    trigger: FetchTrigger,
    language: Language,
    prepare: impl FnOnce(&mut Vec<Record>),
) -> bool {
    let ticket = view.begin_fetch(trigger);
    let query = query.with_filters(view.filters());

    let spinner = ui::new_spinner(language.loading());
    let result = source.fetch_records(&query).await.map(|mut records| {
        prepare(&mut records);
        records
    });
    spinner.finish_and_clear();

    view.complete_fetch(ticket, result)
}

/// Builds a list page view from command line options.
pub fn new_view(
    tab: &str,
    default_sort: SortState,
    context: SortContext,
    page_size: usize,
    options: &ListOptions,
) -> ListView {
    ListView::new(tab, default_sort, context)
        .with_page_size(page_size)
        .with_filters(options.filters.iter().cloned())
}

/// Renders the visible page with footer lines for paging, sort and filters.
pub fn render(view: &ListView, title: &str, columns: &[Column], language: Language) -> String {
    let mut output = format!("{}\n\n", ui::style_text(title, ui::StyleType::Title));

    match view.state() {
        ViewState::Loading => {
            output.push_str(&language.loading());
            return output;
        }
        ViewState::Idle | ViewState::Empty => {
            output.push_str(&ui::style_text(&language.no_data(), ui::StyleType::Subtle));
            return output;
        }
        ViewState::Loaded => {}
    }

    let sort = view.sort();
    let mut table = ui::new_styled_table();
    table.set_header(columns.iter().map(|column| {
        let label = language.label(column.label);
        if column.key == sort.key {
            ui::sorted_header_cell(&label, sort.direction == SortDirection::Ascending)
        } else {
            ui::header_cell(&label)
        }
    }));

    for record in view.visible_rows() {
        table.add_row(columns.iter().map(|column| column.cell(record)));
    }
    output.push_str(&table.to_string());

    let sort_label = columns
        .iter()
        .find(|c| c.key == sort.key)
        .map_or_else(|| sort.key.clone(), |c| language.label(c.label));

    output.push_str("\n\n");
    output.push_str(&ui::style_text(
        &language.page_footer(view.page(), view.page_count(), view.records().len()),
        ui::StyleType::Subtle,
    ));
    output.push('\n');
    output.push_str(&ui::style_text(
        &language.sorted_by(&sort_label, &sort.direction.to_string()),
        ui::StyleType::Subtle,
    ));

    if !view.filters().is_empty() {
        let filters = view
            .filters()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(", ");
        output.push('\n');
        output.push_str(&ui::style_text(&language.filters(&filters), ui::StyleType::Subtle));
    }

    debug!(tab = view.tab(), rows = view.visible_rows().len(), "Rendered list page");
    output
}
