pub mod caching;
pub mod records_api;
pub mod util;
pub mod yahoo_finance;

pub use caching::CachingRecordSource;
pub use records_api::HttpRecordSource;
pub use yahoo_finance::YahooChartProvider;
