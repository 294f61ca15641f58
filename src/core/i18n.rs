//! Display language. Passed explicitly to renderers instead of relying on a
//! process-wide locale.

use rust_i18n::t;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh-CN", alias = "zh", alias = "cn")]
    Chinese,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh-CN",
        }
    }

    /// Translated label for `key`, e.g. `column.symbol`.
    pub fn label(&self, key: &str) -> String {
        t!(key, locale = self.code())
    }

    pub fn no_data(&self) -> String {
        t!("app.no_data", locale = self.code())
    }

    pub fn loading(&self) -> String {
        t!("app.loading", locale = self.code())
    }

    pub fn page_footer(&self, page: usize, pages: usize, count: usize) -> String {
        t!("app.page", locale = self.code(), page = page, pages = pages, count = count)
    }

    pub fn sorted_by(&self, key: &str, direction: &str) -> String {
        t!("app.sorted_by", locale = self.code(), key = key, direction = direction)
    }

    pub fn filters(&self, filters: &str) -> String {
        t!("app.filters", locale = self.code(), filters = filters)
    }

    pub fn constituents_title(&self, index: &str) -> String {
        t!("title.constituents", locale = self.code(), index = index)
    }

    pub fn history_title(&self, index: &str) -> String {
        t!("title.history", locale = self.code(), index = index)
    }

    pub fn chart_title(&self, symbol: &str) -> String {
        t!("title.chart", locale = self.code(), symbol = symbol)
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "zh" | "zh-cn" | "cn" | "chinese" => Ok(Language::Chinese),
            _ => Err(anyhow::anyhow!("Unsupported language: {}", s)),
        }
    }
}
