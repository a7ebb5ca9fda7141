// src/illustrate/providers/unsplash.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::illustrate::ImageProvider;

#[derive(Debug, Deserialize)]
struct SearchReply {
    #[serde(default)]
    results: Vec<Photo>,
}
#[derive(Debug, Deserialize)]
struct Photo {
    urls: PhotoUrls,
}
#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

/// Unsplash photo search. Free tier, `Client-ID` auth.
pub struct UnsplashProvider {
    http: reqwest::Client,
    access_key: String,
}

impl UnsplashProvider {
    pub fn new(access_key: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("gurbetci-poster/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self { http, access_key }
    }
}

#[async_trait]
impl ImageProvider for UnsplashProvider {
    async fn resolve(&self, query: &str) -> Result<Option<String>> {
        let reply: SearchReply = self
            .http
            .get("https://api.unsplash.com/search/photos")
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .query(&[
                ("query", query),
                ("orientation", "landscape"),
                ("per_page", "5"),
            ])
            .send()
            .await
            .context("unsplash request")?
            .error_for_status()
            .context("unsplash status")?
            .json()
            .await
            .context("unsplash body")?;

        Ok(reply.results.into_iter().next().map(|p| p.urls.regular))
    }

    fn name(&self) -> &'static str {
        "unsplash"
    }
}
