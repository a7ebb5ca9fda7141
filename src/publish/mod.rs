// src/publish/mod.rs
//! Publisher: upload the rendered image to a hosting backend, create a Graph
//! API media container, poll it until processable, then finalize the post.
//! The whole state machine lives here; the orchestrator only sees one call.

pub mod hosting;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub use hosting::{HostingBackend, ImgbbBackend, SupabaseBackend};

const GRAPH_API_URL: &str = "https://graph.facebook.com/v18.0";

pub const POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const POLL_BUDGET: Duration = Duration::from_secs(60);

/// Fixed caption attached to every post.
pub const POST_CAPTION: &str = "Daha fazlası için Google Play veya App Store'dan
Gurbetci SuperApp'i ücretsiz indir. Link biyografide.
#gurbetci #gurbetcisuperapp";

/// Container readiness as reported (or concluded) during polling. The remote
/// API only ever reports the first three; `Timeout` is our own terminal
/// state when the poll budget runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Pending,
    Finished,
    Error,
    Timeout,
}

impl ContainerStatus {
    /// Map the remote `status_code` field. Unknown codes (e.g.
    /// `IN_PROGRESS`) count as still pending.
    pub fn from_code(code: &str) -> Self {
        match code {
            "FINISHED" => Self::Finished,
            "ERROR" => Self::Error,
            _ => Self::Pending,
        }
    }
}

/// Per-run record of the publish state machine.
#[derive(Debug, Clone)]
pub struct PublishHandle {
    pub upload_url: String,
    pub container_id: String,
    pub status: ContainerStatus,
}

/// The create-container / poll-status / publish protocol, as a seam so the
/// poll loop and the orchestrator can be tested without the network.
#[async_trait]
pub trait MediaApi: Send + Sync {
    async fn create_container(&self, image_url: &str, caption: &str) -> Result<String>;
    async fn container_status(&self, container_id: &str) -> Result<ContainerStatus>;
    async fn publish(&self, creation_id: &str) -> Result<String>;
}

/// Instagram Graph API implementation, authenticated by a bearer token and
/// an account id.
pub struct GraphMediaApi {
    http: reqwest::Client,
    access_token: String,
    account_id: String,
    base_url: String,
}

impl GraphMediaApi {
    pub fn new(access_token: String, account_id: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("gurbetci-poster/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            access_token,
            account_id,
            base_url: GRAPH_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdReply {
    id: String,
}
#[derive(Debug, Deserialize)]
struct StatusReply {
    #[serde(default)]
    status_code: Option<String>,
}

#[async_trait]
impl MediaApi for GraphMediaApi {
    async fn create_container(&self, image_url: &str, caption: &str) -> Result<String> {
        let url = format!("{}/{}/media", self.base_url, self.account_id);
        let reply: IdReply = self
            .http
            .post(&url)
            .form(&[
                ("image_url", image_url),
                ("caption", caption),
                ("access_token", &self.access_token),
            ])
            .send()
            .await
            .context("container create request")?
            .error_for_status()
            .context("container create status")?
            .json()
            .await
            .context("container create body")?;
        Ok(reply.id)
    }

    async fn container_status(&self, container_id: &str) -> Result<ContainerStatus> {
        let url = format!("{}/{}", self.base_url, container_id);
        let reply: StatusReply = self
            .http
            .get(&url)
            .query(&[
                ("fields", "status_code"),
                ("access_token", &self.access_token),
            ])
            .send()
            .await
            .context("container status request")?
            .error_for_status()
            .context("container status http")?
            .json()
            .await
            .context("container status body")?;
        Ok(ContainerStatus::from_code(
            reply.status_code.as_deref().unwrap_or_default(),
        ))
    }

    async fn publish(&self, creation_id: &str) -> Result<String> {
        let url = format!("{}/{}/media_publish", self.base_url, self.account_id);
        let reply: IdReply = self
            .http
            .post(&url)
            .form(&[
                ("creation_id", creation_id),
                ("access_token", &self.access_token),
            ])
            .send()
            .await
            .context("media publish request")?
            .error_for_status()
            .context("media publish status")?
            .json()
            .await
            .context("media publish body")?;
        Ok(reply.id)
    }
}

/// Poll the container until it reaches a terminal state or the budget is
/// exhausted. Transient poll errors are tolerated and retried within the
/// same budget; the timeout is explicit, not an external wrapper.
pub async fn wait_until_ready(
    api: &dyn MediaApi,
    container_id: &str,
    interval: Duration,
    budget: Duration,
) -> ContainerStatus {
    let deadline = tokio::time::Instant::now() + budget;
    loop {
        match api.container_status(container_id).await {
            Ok(ContainerStatus::Finished) => return ContainerStatus::Finished,
            Ok(ContainerStatus::Error) => {
                tracing::error!(container_id, "container reported ERROR");
                return ContainerStatus::Error;
            }
            Ok(_) => {
                tracing::debug!(container_id, "container still pending");
            }
            Err(e) => {
                tracing::warn!(container_id, error = ?e, "transient poll error, retrying");
            }
        }
        if tokio::time::Instant::now() + interval >= deadline {
            tracing::error!(container_id, "container readiness poll timed out");
            return ContainerStatus::Timeout;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Owns the upload + container + publish sequence.
pub struct Publisher {
    hosting: Vec<Box<dyn HostingBackend>>,
    api: Box<dyn MediaApi>,
    poll_interval: Duration,
    poll_budget: Duration,
}

impl Publisher {
    pub fn new(hosting: Vec<Box<dyn HostingBackend>>, api: Box<dyn MediaApi>) -> Self {
        Self {
            hosting,
            api,
            poll_interval: POLL_INTERVAL,
            poll_budget: POLL_BUDGET,
        }
    }

    pub fn with_poll_timing(mut self, interval: Duration, budget: Duration) -> Self {
        self.poll_interval = interval;
        self.poll_budget = budget;
        self
    }

    /// Run the full state machine for one rendered image. Returns the
    /// remote post id. Any terminal failure (no host accepted the upload,
    /// container creation failed, container ended in ERROR/TIMEOUT, publish
    /// call failed) is an error.
    pub async fn publish_post(&self, image_path: &Path) -> Result<String> {
        let upload_url = self.upload_to_first_available(image_path).await?;
        let container_id = self
            .api
            .create_container(&upload_url, POST_CAPTION)
            .await
            .context("creating media container")?;
        let mut handle = PublishHandle {
            upload_url,
            container_id,
            status: ContainerStatus::Pending,
        };
        tracing::info!(container_id = %handle.container_id, "media container created");

        handle.status = wait_until_ready(
            self.api.as_ref(),
            &handle.container_id,
            self.poll_interval,
            self.poll_budget,
        )
        .await;
        if handle.status != ContainerStatus::Finished {
            return Err(anyhow!(
                "container {} not processable: {:?}",
                handle.container_id,
                handle.status
            ));
        }

        let post_id = self
            .api
            .publish(&handle.container_id)
            .await
            .context("publishing media container")?;
        tracing::info!(post_id = %post_id, "post published");
        Ok(post_id)
    }

    async fn upload_to_first_available(&self, image_path: &Path) -> Result<String> {
        for backend in &self.hosting {
            match backend.upload(image_path).await {
                Ok(url) => {
                    tracing::info!(backend = backend.name(), url = %url, "image hosted");
                    return Ok(url);
                }
                Err(e) => {
                    tracing::warn!(backend = backend.name(), error = ?e, "hosting upload failed");
                }
            }
        }
        Err(anyhow!("no hosting backend accepted the upload"))
    }
}
