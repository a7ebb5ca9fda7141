// src/publish/hosting.rs
//! Hosting backends: the Graph API needs a publicly fetchable URL, so the
//! rendered file is pushed to exactly one configured host first.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[async_trait]
pub trait HostingBackend: Send + Sync {
    /// Upload a local file and return its public URL.
    async fn upload(&self, path: &Path) -> Result<String>;
    fn name(&self) -> &'static str;
}

fn http_client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("gurbetci-poster/0.1")
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("reqwest client")
}

/// imgbb upload, 24-hour expiration (long enough for the Graph API to pull
/// the image, short enough to not accumulate).
pub struct ImgbbBackend {
    http: reqwest::Client,
    api_key: String,
}

const IMGBB_EXPIRATION_SECS: u32 = 86_400;

impl ImgbbBackend {
    pub fn new(api_key: String) -> Self {
        Self {
            http: http_client(60),
            api_key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImgbbReply {
    success: bool,
    #[serde(default)]
    data: Option<ImgbbData>,
}
#[derive(Debug, Deserialize)]
struct ImgbbData {
    url: String,
}

#[async_trait]
impl HostingBackend for ImgbbBackend {
    async fn upload(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("post.png")
            .to_string();
        let form = reqwest::multipart::Form::new()
            .text("key", self.api_key.clone())
            .text("expiration", IMGBB_EXPIRATION_SECS.to_string())
            .part(
                "image",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            );

        let reply: ImgbbReply = self
            .http
            .post("https://api.imgbb.com/1/upload")
            .multipart(form)
            .send()
            .await
            .context("imgbb request")?
            .error_for_status()
            .context("imgbb status")?
            .json()
            .await
            .context("imgbb body")?;

        match reply.data {
            Some(data) if reply.success => Ok(data.url),
            _ => Err(anyhow!("imgbb upload rejected")),
        }
    }

    fn name(&self) -> &'static str {
        "imgbb"
    }
}

/// Supabase Storage upload into a public bucket.
pub struct SupabaseBackend {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
    bucket: String,
}

impl SupabaseBackend {
    pub fn new(base_url: String, service_key: String) -> Self {
        Self {
            http: http_client(60),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            bucket: "instagram-posts".to_string(),
        }
    }
}

#[async_trait]
impl HostingBackend for SupabaseBackend {
    async fn upload(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        let file_name = format!("post_{}.png", chrono::Utc::now().timestamp());
        let upload_url = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, file_name
        );

        self.http
            .post(&upload_url)
            .bearer_auth(&self.service_key)
            .header("Content-Type", "image/png")
            .body(bytes)
            .send()
            .await
            .context("supabase request")?
            .error_for_status()
            .context("supabase status")?;

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, file_name
        ))
    }

    fn name(&self) -> &'static str {
        "supabase"
    }
}
