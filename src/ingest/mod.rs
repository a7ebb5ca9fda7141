// src/ingest/mod.rs
pub mod feed_rss;
pub mod types;

use chrono::{NaiveDate, Utc};

use crate::ingest::types::NewsRecord;

/// Normalize body text coming out of the feed: decode entities, strip tags,
/// fold curly quotes, collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 5) Length cap: 1500 chars (sentence punctuation is kept; the condenser
    //    relies on terminators being present)
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

/// Keep only records carrying the given locale tag.
pub fn filter_locale(records: Vec<NewsRecord>, locale_tag: &str) -> Vec<NewsRecord> {
    records
        .into_iter()
        .filter(|r| r.locale_tag.eq_ignore_ascii_case(locale_tag))
        .collect()
}

/// Keep only records published on the given UTC date.
pub fn filter_published_on(records: Vec<NewsRecord>, date: NaiveDate) -> Vec<NewsRecord> {
    records
        .into_iter()
        .filter(|r| r.published_at.date_naive() == date)
        .collect()
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}
