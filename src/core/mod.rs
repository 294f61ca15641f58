//! Core business logic abstractions

pub mod cache;
pub mod config;
pub mod fund;
pub mod i18n;
pub mod log;
pub mod market;
pub mod record;
pub mod session;
pub mod source;
pub mod table;
pub mod view;

// Re-export main types for cleaner imports
pub use i18n::Language;
pub use record::{FieldValue, Record};
pub use session::{BarInterval, ChartSeries, PricePoint, SessionWindow, TradingSession};
pub use source::{ChartProvider, Dataset, RecordQuery, RecordSource};
pub use table::{SortContext, SortDirection, SortState};
pub use view::{FetchTrigger, ListView, ViewState};
