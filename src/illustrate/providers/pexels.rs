// src/illustrate/providers/pexels.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::illustrate::ImageProvider;

#[derive(Debug, Deserialize)]
struct SearchReply {
    #[serde(default)]
    photos: Vec<Photo>,
}
#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSrc,
}
#[derive(Debug, Deserialize)]
struct PhotoSrc {
    large: String,
}

/// Pexels photo search, the secondary provider.
pub struct PexelsProvider {
    http: reqwest::Client,
    api_key: String,
}

impl PexelsProvider {
    pub fn new(api_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("gurbetci-poster/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self { http, api_key }
    }
}

#[async_trait]
impl ImageProvider for PexelsProvider {
    async fn resolve(&self, query: &str) -> Result<Option<String>> {
        let reply: SearchReply = self
            .http
            .get("https://api.pexels.com/v1/search")
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query),
                ("orientation", "landscape"),
                ("per_page", "5"),
            ])
            .send()
            .await
            .context("pexels request")?
            .error_for_status()
            .context("pexels status")?
            .json()
            .await
            .context("pexels body")?;

        Ok(reply.photos.into_iter().next().map(|p| p.src.large))
    }

    fn name(&self) -> &'static str {
        "pexels"
    }
}
