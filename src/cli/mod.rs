pub mod chart;
pub mod constituents;
pub mod etf;
pub mod history;
pub mod list;
pub mod quota;
pub mod setup;
pub mod ui;

pub use list::ListOptions;
