//! Binary entrypoint. One invocation is one pipeline run; the external
//! scheduler (a cron workflow) handles repetition. Exit code 0 means a post
//! was produced (published or kept locally), 1 means a terminal abort.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gurbetci_poster::analyze::ai_client::OpenAiClient;
use gurbetci_poster::analyze::condenser::Condenser;
use gurbetci_poster::analyze::selector::Selector;
use gurbetci_poster::compose::{TemplateAssets, TemplateCompositor};
use gurbetci_poster::config::AppConfig;
use gurbetci_poster::illustrate::providers::{PexelsProvider, UnsplashProvider};
use gurbetci_poster::illustrate::{HttpFetcher, IllustrationSourcer, ImageProvider};
use gurbetci_poster::ingest::feed_rss::RssFeedSource;
use gurbetci_poster::pipeline::Pipeline;
use gurbetci_poster::publish::{
    GraphMediaApi, HostingBackend, ImgbbBackend, Publisher, SupabaseBackend,
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gurbetci_poster=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_pipeline(config: &AppConfig) -> Pipeline {
    let reasoning = Arc::new(OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_model.clone(),
    ));

    let mut providers: Vec<Box<dyn ImageProvider>> = Vec::new();
    if let Some(key) = &config.unsplash_access_key {
        providers.push(Box::new(UnsplashProvider::new(key.clone())));
    }
    if let Some(key) = &config.pexels_api_key {
        providers.push(Box::new(PexelsProvider::new(key.clone())));
    }

    let mut hosting: Vec<Box<dyn HostingBackend>> = Vec::new();
    if let Some(key) = &config.imgbb_api_key {
        hosting.push(Box::new(ImgbbBackend::new(key.clone())));
    }
    if let Some(supabase) = &config.supabase {
        hosting.push(Box::new(SupabaseBackend::new(
            supabase.base_url.clone(),
            supabase.service_key.clone(),
        )));
    }

    let publisher = config.instagram.as_ref().map(|creds| {
        Publisher::new(
            hosting,
            Box::new(GraphMediaApi::new(
                creds.access_token.clone(),
                creds.account_id.clone(),
            )),
        )
    });

    Pipeline {
        feed: Box::new(RssFeedSource::new(&config.feed_url)),
        selector: Selector::new(reasoning.clone()),
        condenser: Condenser::new(reasoning),
        illustrator: IllustrationSourcer::new(providers, Box::new(HttpFetcher::new())),
        renderer: Box::new(TemplateCompositor::new(TemplateAssets::from_dirs(
            &config.assets_dir,
            &config.font_path,
        ))),
        publisher,
        locale_tag: config.locale_tag.clone(),
        output_dir: config.output_dir.clone(),
    }
}

#[tokio::main]
async fn main() {
    // Load .env in local runs; a no-op when the scheduler injects real env.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let pipeline = build_pipeline(&config);
    match pipeline.run().await {
        Ok(outcome) => {
            match &outcome.post_id {
                Some(id) => tracing::info!(post_id = %id, "run complete, post published"),
                None => tracing::info!(
                    rendered = %outcome.rendered_path.display(),
                    "run complete, publish skipped"
                ),
            }
            std::process::exit(0);
        }
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            std::process::exit(1);
        }
    }
}
