//! List view model: fetch lifecycle, sort state and paging for one table

use crate::core::record::Record;
use crate::core::table::{self, SortContext, SortDirection, SortState};
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Loading,
    Loaded,
    Empty,
}

/// What caused a (re)fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTrigger {
    Mount,
    TabChange,
    FilterChange,
    Refresh,
}

/// Handle for an issued fetch. Only the most recently issued ticket may
/// update the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct RequestTicket {
    seq: u64,
    pub trigger: FetchTrigger,
}

/// Issues monotonically increasing request numbers and remembers the latest.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, seq: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == seq
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 20;

/// State of one list page (constituents, fund quotas, ETFs).
///
/// Records are kept in display order; every change of records or sort
/// re-derives that order. The page number returns to 1 whenever the tab,
/// the filters or the loaded record set change.
#[derive(Debug)]
pub struct ListView {
    tab: String,
    filters: BTreeMap<String, String>,
    sort: SortState,
    context: SortContext,
    page: usize,
    page_size: usize,
    records: Vec<Record>,
    state: ViewState,
    sequencer: RequestSequencer,
}

impl ListView {
    pub fn new(tab: impl Into<String>, sort: SortState, context: SortContext) -> Self {
        Self {
            tab: tab.into(),
            filters: BTreeMap::new(),
            sort,
            context,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            records: Vec::new(),
            state: ViewState::Idle,
            sequencer: RequestSequencer::new(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Initial filters for a view that has not fetched yet.
    pub fn with_filters<K, V>(mut self, filters: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.filters
            .extend(filters.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn tab(&self) -> &str {
        &self.tab
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn sort(&self) -> &SortState {
        &self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn page_count(&self) -> usize {
        table::page_count(self.records.len(), self.page_size)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn visible_rows(&self) -> &[Record] {
        table::paginate(&self.records, self.page, self.page_size)
    }

    pub fn begin_fetch(&mut self, trigger: FetchTrigger) -> RequestTicket {
        let seq = self.sequencer.issue();
        debug!(tab = %self.tab, seq, ?trigger, "Fetch started");
        self.state = ViewState::Loading;
        RequestTicket { seq, trigger }
    }

    /// Applies a fetch result. Returns false when the ticket was superseded
    /// by a newer fetch and the result was dropped.
    pub fn complete_fetch(&mut self, ticket: RequestTicket, result: Result<Vec<Record>>) -> bool {
        if !self.sequencer.is_latest(ticket.seq) {
            debug!(tab = %self.tab, seq = ticket.seq, "Discarding stale fetch result");
            return false;
        }

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                warn!(tab = %self.tab, error = %e, "Fetch failed, showing empty view");
                Vec::new()
            }
        };

        self.records = records;
        table::sort_in_place(&mut self.records, &self.sort, self.context);
        self.page = 1;
        self.state = if self.records.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Loaded
        };
        debug!(tab = %self.tab, count = self.records.len(), state = ?self.state, "Fetch applied");
        true
    }

    pub fn set_tab(&mut self, tab: impl Into<String>) -> RequestTicket {
        self.tab = tab.into();
        self.page = 1;
        self.begin_fetch(FetchTrigger::TabChange)
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: impl Into<String>) -> RequestTicket {
        self.filters.insert(key.into(), value.into());
        self.page = 1;
        self.begin_fetch(FetchTrigger::FilterChange)
    }

    pub fn clear_filter(&mut self, key: &str) -> RequestTicket {
        self.filters.remove(key);
        self.page = 1;
        self.begin_fetch(FetchTrigger::FilterChange)
    }

    /// Header click: the active key flips direction, a new key starts
    /// descending.
    pub fn sort_by(&mut self, key: &str) {
        let sort = if self.sort.key == key {
            SortState::new(key, self.sort.direction.flipped())
        } else {
            SortState::new(key, SortDirection::Descending)
        };
        self.set_sort(sort);
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
        table::sort_in_place(&mut self.records, &self.sort, self.context);
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count().max(1));
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.go_to_page(self.page.saturating_sub(1));
    }
}
