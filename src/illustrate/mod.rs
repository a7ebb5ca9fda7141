// src/illustrate/mod.rs
//! Illustration sourcing: maps keywords to a search query, then walks an
//! ordered fallback chain of image providers until one yields a downloadable
//! URL. A hardcoded default image closes the chain, so only a fully dead
//! network makes this stage fail.

pub mod providers;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Guaranteed last resort when every provider comes up empty.
pub const DEFAULT_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1519197924294-4ba991a11128?w=800&q=80";

/// Generic regional queries, decoupled from the item's keywords.
pub const GENERIC_QUERIES: [&str; 2] = ["Poland city architecture", "Poland warsaw"];

const QUERY_PREFIX: &str = "Poland news ";
const GENERIC_FALLBACK_QUERY: &str = "Poland city news politics";
const MIN_MEANINGFUL_QUERY_LEN: usize = 20;
const KEYWORDS_CONSIDERED: usize = 3;

/// Fixed keyword-stem → search-term vocabulary. Keywords come back from the
/// condenser in Turkish; searches run in English.
const BUILTIN_TOPICS: &[(&str, &str)] = &[
    ("politika", "politics government"),
    ("ekonomi", "economy finance"),
    ("göçmen", "immigration migrants"),
    ("mülteci", "refugees"),
    ("güvenlik", "security police"),
    ("sağlık", "health hospital"),
    ("eğitim", "education school"),
    ("ulaşım", "transport traffic"),
    ("ukrayna", "ukraine war"),
    ("polonya", "poland warsaw"),
    ("almanya", "germany berlin"),
    ("avrupa", "europe eu"),
    ("hükümet", "government parliament"),
];

/// One capability: turn a query into at most one candidate image URL.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Option<String>>;
    fn name(&self) -> &'static str;
}

/// Download seam, separated from the providers so the chain is testable
/// without a network.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<()>;
}

pub struct HttpFetcher {
    http: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("gurbetci-poster/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self { http }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<()> {
        let bytes = self
            .http
            .get(url)
            .send()
            .await
            .context("image download request")?
            .error_for_status()
            .context("image download status")?
            .bytes()
            .await
            .context("image download body")?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(dest, &bytes).with_context(|| format!("writing {}", dest.display()))?;
        Ok(())
    }
}

/// Topic vocabulary, overridable via `config/image_topics.toml`
/// (`[topics]` table of stem = "search terms").
pub fn load_topic_vocabulary() -> Vec<(String, String)> {
    let path = Path::new("config/image_topics.toml");
    match fs::read_to_string(path) {
        Ok(s) => match parse_topics_toml(&s) {
            Ok(v) if !v.is_empty() => return v,
            Ok(_) => tracing::warn!("empty topic vocabulary file, using builtin"),
            Err(e) => tracing::warn!(error = %e, "unreadable topic vocabulary file, using builtin"),
        },
        Err(_) => {}
    }
    BUILTIN_TOPICS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn parse_topics_toml(s: &str) -> Result<Vec<(String, String)>> {
    #[derive(serde::Deserialize)]
    struct Topics {
        topics: std::collections::BTreeMap<String, String>,
    }
    let t: Topics = toml::from_str(s)?;
    Ok(t.topics.into_iter().collect())
}

/// Compose the provider query from the condenser's keywords. Each keyword is
/// matched against the vocabulary stems; unmatched keywords contribute
/// nothing. A too-short result is replaced by a generic regional query.
pub fn build_search_query(vocabulary: &[(String, String)], keywords: &[String]) -> String {
    let mut query = String::from(QUERY_PREFIX);
    for keyword in keywords.iter().take(KEYWORDS_CONSIDERED) {
        let lower = keyword.to_lowercase();
        if let Some((_, terms)) = vocabulary.iter().find(|(stem, _)| lower.contains(stem)) {
            query.push_str(terms);
            query.push(' ');
        }
    }
    let query = query.trim();
    if query.len() < MIN_MEANINGFUL_QUERY_LEN {
        return GENERIC_FALLBACK_QUERY.to_string();
    }
    query.to_string()
}

pub struct IllustrationSourcer {
    providers: Vec<Box<dyn ImageProvider>>,
    fetcher: Box<dyn ImageFetcher>,
    vocabulary: Vec<(String, String)>,
}

impl IllustrationSourcer {
    pub fn new(providers: Vec<Box<dyn ImageProvider>>, fetcher: Box<dyn ImageFetcher>) -> Self {
        Self {
            providers,
            fetcher,
            vocabulary: load_topic_vocabulary(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: Vec<(String, String)>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Resolve and download a best-effort illustration to `dest`.
    ///
    /// Chain order: keyword query on each provider, then the generic regional
    /// queries on each provider, then the hardcoded default image. A download
    /// failure counts as "no result" and the chain continues.
    pub async fn source(&self, keywords: &[String], title: &str, dest: &Path) -> Result<PathBuf> {
        let query = build_search_query(&self.vocabulary, keywords);
        tracing::info!(query = %query, title = %title, "searching for illustration");

        if self.try_query_on_providers(&query, dest).await {
            return Ok(dest.to_path_buf());
        }

        for generic in GENERIC_QUERIES {
            tracing::info!(query = generic, "keyword search empty, trying generic query");
            if self.try_query_on_providers(generic, dest).await {
                return Ok(dest.to_path_buf());
            }
        }

        tracing::warn!("all providers empty, falling back to default image");
        self.fetcher
            .fetch_to(DEFAULT_IMAGE_URL, dest)
            .await
            .map_err(|e| anyhow!("default image download failed: {e:#}"))?;
        Ok(dest.to_path_buf())
    }

    async fn try_query_on_providers(&self, query: &str, dest: &Path) -> bool {
        for provider in &self.providers {
            let url = match provider.resolve(query).await {
                Ok(Some(url)) => url,
                Ok(None) => {
                    tracing::debug!(provider = provider.name(), query, "no results");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = ?e, "provider error");
                    continue;
                }
            };
            match self.fetcher.fetch_to(&url, dest).await {
                Ok(()) => {
                    tracing::info!(provider = provider.name(), url = %url, "illustration downloaded");
                    return true;
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), url = %url, error = ?e, "download failed, continuing chain");
                }
            }
        }
        false
    }
}
