// src/ingest/feed_rss.rs
//! RSS feed source. Entries are mapped into `NewsRecord` through one strict
//! normalization step: an entry missing its title, publication date, or
//! country marker is rejected with a logged reason instead of being probed
//! for alternative fields.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::time::Duration;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::ingest::normalize_text;
use crate::ingest::types::{FeedSource, NewsRecord};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}
#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}
#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "encoded", alias = "content:encoded")]
    content: Option<String>,
    country: Option<String>,
    category: Option<String>,
    #[serde(rename = "creator", alias = "dc:creator")]
    creator: Option<String>,
    author: Option<String>,
}

fn parse_rfc2822_utc(ts: &str) -> Option<DateTime<Utc>> {
    let unix = OffsetDateTime::parse(ts, &Rfc2822)
        .ok()?
        .to_offset(UtcOffset::UTC)
        .unix_timestamp();
    DateTime::from_timestamp(unix, 0)
}

enum Mode {
    Http { url: String, client: reqwest::Client },
    Fixture(String),
}

/// Feed source backed by the syndicated news feed.
pub struct RssFeedSource {
    mode: Mode,
}

impl RssFeedSource {
    pub fn new(url: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("gurbetci-poster/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self {
            mode: Mode::Http {
                url: url.to_string(),
                client,
            },
        }
    }

    /// Parse from an in-memory XML document (tests, local runs).
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    fn parse_records_from_str(s: &str) -> Result<Vec<NewsRecord>> {
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing news feed xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = match it.title.as_deref().map(str::trim) {
                Some(t) if !t.is_empty() => t.to_string(),
                _ => {
                    tracing::warn!(reason = "missing title", "rejecting feed entry");
                    continue;
                }
            };
            let published_at = match it.pub_date.as_deref().and_then(parse_rfc2822_utc) {
                Some(dt) => dt,
                None => {
                    tracing::warn!(
                        title = %title,
                        reason = "missing or unparsable pubDate",
                        "rejecting feed entry"
                    );
                    continue;
                }
            };
            let locale_tag = match it.country.as_deref().map(str::trim) {
                Some(c) if !c.is_empty() => c.to_ascii_lowercase(),
                _ => {
                    tracing::warn!(
                        title = %title,
                        reason = "missing country marker",
                        "rejecting feed entry"
                    );
                    continue;
                }
            };

            // content:encoded carries the full article body; description is
            // the short teaser fallback.
            let body_raw = it
                .content
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .or(it.description.as_deref())
                .unwrap_or_default();
            let source_name = it
                .creator
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .or(it.author.as_deref())
                .unwrap_or_default()
                .trim()
                .to_string();

            out.push(NewsRecord {
                title,
                body_text: normalize_text(body_raw),
                published_at,
                source_name,
                category: it.category.unwrap_or_default().trim().to_string(),
                locale_tag,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl FeedSource for RssFeedSource {
    async fn fetch(&self) -> Result<Vec<NewsRecord>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_records_from_str(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("news feed http get()")?
                    .error_for_status()
                    .context("news feed http status")?
                    .text()
                    .await
                    .context("news feed http .text()")?;
                Self::parse_records_from_str(&body)
            }
        }
    }

    fn name(&self) -> &'static str {
        "news-feed"
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
