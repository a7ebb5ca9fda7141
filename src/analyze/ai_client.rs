// src/analyze/ai_client.rs
//! Reasoning-service boundary: a small trait over chat completions so the
//! selector and condenser can be driven by a mock in tests.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub user: &'a str,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[async_trait]
pub trait ReasoningClient: Send + Sync {
    /// Returns the raw assistant message text.
    async fn complete(&self, req: CompletionRequest<'_>) -> Result<String>;
    fn provider_name(&self) -> &'static str;
}

/// OpenAI chat-completions client. Requires an API key; the model is
/// configurable (`gpt-4o` by default upstream).
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("gurbetci-poster/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ReasoningClient for OpenAiClient {
    async fn complete(&self, req: CompletionRequest<'_>) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: req.system,
                },
                Msg {
                    role: "user",
                    content: req.user,
                },
            ],
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        };

        let resp = self
            .http
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("reasoning service request")?;
        let resp = resp
            .error_for_status()
            .context("reasoning service status")?;
        let parsed: Resp = resp.json().await.context("reasoning service body")?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(anyhow!("reasoning service returned no content"));
        }
        Ok(content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Unwrap a Markdown code fence around a JSON payload. Models sometimes wrap
/// structured output in ``` or ```json despite instructions.
pub fn strip_code_fence(raw: &str) -> &str {
    let t = raw.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_payload_is_untouched() {
        assert_eq!(strip_code_fence(r#"{"a":1}"#), r#"{"a":1}"#);
    }

    #[test]
    fn bare_fence_is_unwrapped() {
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), r#"{"a":1}"#);
    }

    #[test]
    fn json_fence_is_unwrapped() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), r#"{"a":1}"#);
    }

    #[test]
    fn unterminated_fence_is_tolerated() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}"), r#"{"a":1}"#);
    }
}
