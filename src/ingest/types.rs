// src/ingest/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};

/// One normalized news item, as produced by the feed source.
/// Immutable once constructed; the selector and condenser only read it.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct NewsRecord {
    pub title: String,
    pub body_text: String,
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub category: String,
    pub locale_tag: String, // e.g. "pl"
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<NewsRecord>>;
    fn name(&self) -> &'static str;
}
