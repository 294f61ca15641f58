//! QDII fund quota rows
//!
//! Quota announcements name funds and companies inconsistently. These
//! helpers derive the fields the quota table sorts and renders by.

use crate::core::record::{FieldValue, Record, parse_numeric};
use crate::core::table::{CURRENCY_KEY, QUOTA_KEY};

pub const FUND_NAME_KEY: &str = "fund_name";
pub const FUND_COMPANY_KEY: &str = "fund_company";
pub const SHARE_CLASS_KEY: &str = "share_class";

const USD_MARKERS: [&str; 3] = ["美元", "美汇", "美钞"];

const COMPANY_SUFFIXES: [&str; 4] = [
    "基金管理有限公司",
    "基金管理股份有限公司",
    "基金管理有限责任公司",
    "基金管理（中国）有限公司",
];

const FUND_TAGS: [&str; 7] = ["QDII", "LOF", "ETF", "REIT", "DAX", "CAC40", "FOF"];

const BOND_SUFFIXES: [&str; 3] = ["美元收益债券", "美元债券", "美元债"];

/// Parses quota text such as `"5,000.00"`. Placeholders read as zero.
pub fn parse_quota(text: &str) -> f64 {
    match text.trim() {
        "" | "-" | "N/A" => 0.0,
        t => parse_numeric(&t.replace(',', "")).unwrap_or(0.0),
    }
}

/// `"USD"` when the fund name marks a dollar share class, else `"CNY"`.
pub fn detect_currency(fund_name: &str) -> &'static str {
    if USD_MARKERS.iter().any(|m| fund_name.contains(m)) {
        "USD"
    } else {
        "CNY"
    }
}

pub fn clean_company_name(company: &str) -> String {
    COMPANY_SUFFIXES
        .iter()
        .fold(company.trim().to_string(), |name, suffix| name.replace(suffix, ""))
}

/// Strips product tags like `(QDII)` or `LOF` and dollar-bond wording.
pub fn clean_fund_name(name: &str) -> String {
    let mut cleaned = name.trim().to_string();
    for tag in FUND_TAGS {
        for pattern in [format!("({tag})"), format!("（{tag}）"), tag.to_string()] {
            cleaned = cleaned.replace(&pattern, "");
        }
    }
    for suffix in BOND_SUFFIXES {
        cleaned = cleaned.replace(suffix, "");
    }
    cleaned.trim().to_string()
}

/// First ASCII capital left in the cleaned name (`A`, `C`, `E`, ...).
pub fn share_class(fund_name: &str) -> Option<char> {
    clean_fund_name(fund_name)
        .chars()
        .find(|c| c.is_ascii_uppercase())
}

/// Fills in `quota`, `currency`, `share_class` and a cleaned `fund_company`
/// for a quota row. Fields the source already provides are kept.
pub fn normalize_quota_record(record: &mut Record) {
    if let Some(text) = record.text(QUOTA_KEY).map(str::to_string) {
        record.insert(QUOTA_KEY, parse_quota(&text));
    }

    let name = record.text(FUND_NAME_KEY).unwrap_or_default().to_string();

    if record.is_missing(CURRENCY_KEY) {
        record.insert(CURRENCY_KEY, detect_currency(&name));
    }

    if record.is_missing(SHARE_CLASS_KEY) {
        let class = share_class(&name).map_or("N/A".to_string(), String::from);
        record.insert(SHARE_CLASS_KEY, class);
    }

    if let Some(company) = record.text(FUND_COMPANY_KEY).map(clean_company_name) {
        record.insert(FUND_COMPANY_KEY, FieldValue::Text(company));
    }
}
