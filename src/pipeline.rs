// src/pipeline.rs
//! Orchestrator: six labeled stages, each feeding the next. Stages 1-5 are
//! run-terminating on failure with a distinct reason; stage 6 is optional
//! when no publish credentials are configured, because the rendered artifact
//! has standalone value.

use std::path::PathBuf;
use thiserror::Error;

use crate::analyze::condenser::Condenser;
use crate::analyze::selector::{Selector, MAX_CANDIDATES};
use crate::compose::PostRenderer;
use crate::illustrate::IllustrationSourcer;
use crate::ingest::types::FeedSource;
use crate::ingest::{filter_locale, filter_published_on, today_utc};
use crate::publish::Publisher;

pub const ILLUSTRATION_FILE: &str = "news_image.jpg";
pub const RENDERED_FILE: &str = "post.png";

/// Terminal abort reasons, one per failing stage. Selection (stage 2) has no
/// variant: it degrades instead of failing.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("stage 1 (feed): fetch failed: {0:#}")]
    Feed(anyhow::Error),
    #[error("stage 1 (feed): no news items available")]
    EmptyFeed,
    #[error("stage 3 (condense): {0:#}")]
    Condense(anyhow::Error),
    #[error("stage 4 (illustrate): {0:#}")]
    Illustration(anyhow::Error),
    #[error("stage 5 (render): {0:#}")]
    Render(anyhow::Error),
    #[error("stage 6 (publish): {0:#}")]
    Publish(anyhow::Error),
}

/// What a successful run produced. `post_id` is `None` when publishing was
/// skipped for missing credentials.
#[derive(Debug)]
pub struct RunOutcome {
    pub rendered_path: PathBuf,
    pub post_id: Option<String>,
}

pub struct Pipeline {
    pub feed: Box<dyn FeedSource>,
    pub selector: Selector,
    pub condenser: Condenser,
    pub illustrator: IllustrationSourcer,
    pub renderer: Box<dyn PostRenderer>,
    /// `None` when publish credentials are not configured.
    pub publisher: Option<Publisher>,
    pub locale_tag: String,
    pub output_dir: PathBuf,
}

impl Pipeline {
    pub async fn run(&self) -> Result<RunOutcome, StageError> {
        // [1/6] fetch + filter
        tracing::info!(stage = "1/6", feed = self.feed.name(), "fetching news feed");
        let all = self.feed.fetch().await.map_err(StageError::Feed)?;
        let local = filter_locale(all, &self.locale_tag);
        let today = filter_published_on(local.clone(), today_utc());
        let candidates = if today.is_empty() {
            tracing::info!(
                locale = %self.locale_tag,
                "no items published today, widening to all locale items"
            );
            local
        } else {
            today
        };
        if candidates.is_empty() {
            return Err(StageError::EmptyFeed);
        }
        tracing::info!(count = candidates.len(), "candidate items ready");

        // [2/6] select (degrades, never aborts)
        tracing::info!(stage = "2/6", "selecting the most important item");
        let capped = &candidates[..candidates.len().min(MAX_CANDIDATES)];
        let selection = self.selector.select(capped).await;
        let chosen = &capped[selection.chosen_index];
        tracing::info!(
            title = %chosen.title,
            score = selection.importance_score,
            "item selected"
        );

        // [3/6] condense
        tracing::info!(stage = "3/6", "condensing the selected item");
        let condensation = self
            .condenser
            .condense(chosen)
            .await
            .map_err(StageError::Condense)?;

        // [4/6] illustration
        tracing::info!(stage = "4/6", "sourcing an illustration");
        let illustration_path = self
            .illustrator
            .source(
                &condensation.keywords,
                &chosen.title,
                &self.output_dir.join(ILLUSTRATION_FILE),
            )
            .await
            .map_err(StageError::Illustration)?;

        // [5/6] render
        tracing::info!(stage = "5/6", "rendering the post image");
        let rendered_path = self.output_dir.join(RENDERED_FILE);
        self.renderer
            .render(
                &condensation.summary_text,
                &illustration_path,
                &rendered_path,
            )
            .map_err(StageError::Render)?;

        // [6/6] publish (soft-optional)
        let post_id = match &self.publisher {
            Some(publisher) => {
                tracing::info!(stage = "6/6", "publishing the post");
                Some(
                    publisher
                        .publish_post(&rendered_path)
                        .await
                        .map_err(StageError::Publish)?,
                )
            }
            None => {
                tracing::warn!(
                    stage = "6/6",
                    rendered = %rendered_path.display(),
                    "publish credentials absent, keeping the rendered artifact locally"
                );
                None
            }
        };

        Ok(RunOutcome {
            rendered_path,
            post_id,
        })
    }
}
