// src/config.rs
//! Startup configuration. Every recognized option is read from the
//! environment exactly once and validated here; components receive explicit
//! values instead of reading globals per call.

use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_FEED_URL: &str =
    "https://iwjkgmvorjtxgjiebkll.supabase.co/storage/v1/object/public/rss-feeds/news-feed.xml";
const DEFAULT_LOCALE_TAG: &str = "pl";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf";

#[derive(Debug, Clone)]
pub struct SupabaseCredentials {
    pub base_url: String,
    pub service_key: String,
}

#[derive(Debug, Clone)]
pub struct InstagramCredentials {
    pub access_token: String,
    pub account_id: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed_url: String,
    pub locale_tag: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub unsplash_access_key: Option<String>,
    pub pexels_api_key: Option<String>,
    pub imgbb_api_key: Option<String>,
    pub supabase: Option<SupabaseCredentials>,
    /// Optional pair; a partial pair counts as absent.
    pub instagram: Option<InstagramCredentials>,
    pub output_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub font_path: PathBuf,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Read and validate all recognized options. Required: the reasoning
    /// credential, at least one image-search provider and at least one
    /// hosting backend. The publish pair is optional; its absence degrades
    /// the run to render-only.
    pub fn from_env() -> Result<Self> {
        let Some(openai_api_key) = env_opt("OPENAI_API_KEY") else {
            bail!("OPENAI_API_KEY is required");
        };

        let unsplash_access_key = env_opt("UNSPLASH_ACCESS_KEY");
        let pexels_api_key = env_opt("PEXELS_API_KEY");
        if unsplash_access_key.is_none() && pexels_api_key.is_none() {
            bail!("at least one image provider credential is required (UNSPLASH_ACCESS_KEY or PEXELS_API_KEY)");
        }

        let imgbb_api_key = env_opt("IMGBB_API_KEY");
        let supabase = match (env_opt("SUPABASE_URL"), env_opt("SUPABASE_SERVICE_KEY")) {
            (Some(base_url), Some(service_key)) => Some(SupabaseCredentials {
                base_url,
                service_key,
            }),
            (None, None) => None,
            _ => {
                tracing::warn!("partial Supabase credentials, ignoring the hosting backend");
                None
            }
        };
        if imgbb_api_key.is_none() && supabase.is_none() {
            bail!("at least one hosting credential is required (IMGBB_API_KEY or SUPABASE_URL + SUPABASE_SERVICE_KEY)");
        }

        let instagram = match (
            env_opt("INSTAGRAM_ACCESS_TOKEN"),
            env_opt("INSTAGRAM_ACCOUNT_ID"),
        ) {
            (Some(access_token), Some(account_id)) => Some(InstagramCredentials {
                access_token,
                account_id,
            }),
            (None, None) => None,
            _ => {
                tracing::warn!("partial Instagram credentials, publishing will be skipped");
                None
            }
        };

        Ok(Self {
            feed_url: env_opt("NEWS_FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            locale_tag: env_opt("NEWS_LOCALE_TAG")
                .unwrap_or_else(|| DEFAULT_LOCALE_TAG.to_string()),
            openai_api_key,
            openai_model: env_opt("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            unsplash_access_key,
            pexels_api_key,
            imgbb_api_key,
            supabase,
            instagram,
            output_dir: env_opt("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("output")),
            assets_dir: env_opt("ASSETS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("assets")),
            font_path: env_opt("FONT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_PATH)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    const ALL_VARS: &[&str] = &[
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "NEWS_FEED_URL",
        "NEWS_LOCALE_TAG",
        "UNSPLASH_ACCESS_KEY",
        "PEXELS_API_KEY",
        "IMGBB_API_KEY",
        "SUPABASE_URL",
        "SUPABASE_SERVICE_KEY",
        "INSTAGRAM_ACCESS_TOKEN",
        "INSTAGRAM_ACCOUNT_ID",
        "OUTPUT_DIR",
        "ASSETS_DIR",
        "FONT_PATH",
    ];

    fn clear_env() {
        for v in ALL_VARS {
            env::remove_var(v);
        }
    }

    #[serial_test::serial]
    #[test]
    fn missing_reasoning_credential_fails() {
        clear_env();
        assert!(AppConfig::from_env().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn missing_image_provider_fails() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "k");
        env::set_var("IMGBB_API_KEY", "k");
        assert!(AppConfig::from_env().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn missing_hosting_fails() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "k");
        env::set_var("PEXELS_API_KEY", "k");
        assert!(AppConfig::from_env().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn minimal_config_passes_without_instagram() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "k");
        env::set_var("PEXELS_API_KEY", "k");
        env::set_var("IMGBB_API_KEY", "k");
        let cfg = AppConfig::from_env().unwrap();
        assert!(cfg.instagram.is_none());
        assert_eq!(cfg.locale_tag, "pl");
        assert_eq!(cfg.feed_url, DEFAULT_FEED_URL);
        assert_eq!(cfg.openai_model, "gpt-4o");
    }

    #[serial_test::serial]
    #[test]
    fn partial_instagram_pair_counts_as_absent() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "k");
        env::set_var("PEXELS_API_KEY", "k");
        env::set_var("IMGBB_API_KEY", "k");
        env::set_var("INSTAGRAM_ACCESS_TOKEN", "t");
        let cfg = AppConfig::from_env().unwrap();
        assert!(cfg.instagram.is_none());
    }

    #[serial_test::serial]
    #[test]
    fn full_config_is_carried_through() {
        clear_env();
        env::set_var("OPENAI_API_KEY", "k");
        env::set_var("UNSPLASH_ACCESS_KEY", "u");
        env::set_var("SUPABASE_URL", "https://x.supabase.co/");
        env::set_var("SUPABASE_SERVICE_KEY", "s");
        env::set_var("INSTAGRAM_ACCESS_TOKEN", "t");
        env::set_var("INSTAGRAM_ACCOUNT_ID", "a");
        env::set_var("NEWS_LOCALE_TAG", "de");
        let cfg = AppConfig::from_env().unwrap();
        assert!(cfg.supabase.is_some());
        assert!(cfg.instagram.is_some());
        assert_eq!(cfg.locale_tag, "de");
        clear_env();
    }
}
