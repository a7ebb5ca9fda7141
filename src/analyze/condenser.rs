// src/analyze/condenser.rs
//! Condenser: turns the selected record into a short, sentence-terminated
//! summary plus topical keywords. Unlike selection this stage is mandatory;
//! a failed condensation terminates the run upstream.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::sync::Arc;

use crate::analyze::ai_client::{strip_code_fence, CompletionRequest, ReasoningClient};
use crate::ingest::types::NewsRecord;

/// Character budget for the rendered summary (three display lines of ~80).
pub const SUMMARY_CHAR_BUDGET: usize = 240;
const MAX_KEYWORDS: usize = 5;

const SYSTEM_PROMPT: &str =
    "You are a professional news writer. Reply with JSON only, no prose, no code fences.";

const SUMMARY_INSTRUCTIONS: &str = "\
Summarize the news item below in Turkish, in at most three short sentences \
and at most 240 characters in total.

Rules:
- Sentence 1: the main event (who did what).
- Sentence 2: key context (where, when, how, why).
- Sentence 3: the consequence or expected impact.
- Keep numbers, dates, amounts, official names, institutions and places.
- Professional news register, active voice, no labels like \"Who:\".
- End on a complete sentence; never stop mid-sentence.

NEWS ITEM:
";

const RESPONSE_FORMAT: &str = r#"
Respond with exactly this JSON object:
{
    "summary": "<the summary text>",
    "keywords": ["<3-5 topical keywords>"]
}"#;

/// The condensed form of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condensation {
    pub summary_text: String,
    pub keywords: Vec<String>,
}

#[derive(Deserialize)]
struct CondenserReply {
    summary: String,
    #[serde(default)]
    keywords: Vec<String>,
}

pub struct Condenser {
    client: Arc<dyn ReasoningClient>,
}

impl Condenser {
    pub fn new(client: Arc<dyn ReasoningClient>) -> Self {
        Self { client }
    }

    pub async fn condense(&self, record: &NewsRecord) -> Result<Condensation> {
        let prompt = format!(
            "{SUMMARY_INSTRUCTIONS}Title: {}\nBody: {}\nSource: {}\nDate: {}\n{RESPONSE_FORMAT}",
            record.title,
            record.body_text,
            record.source_name,
            record.published_at.to_rfc3339(),
        );

        let raw = self
            .client
            .complete(CompletionRequest {
                system: SYSTEM_PROMPT,
                user: &prompt,
                temperature: 0.4,
                max_tokens: 500,
            })
            .await
            .context("condensation request")?;

        let reply: CondenserReply = serde_json::from_str(strip_code_fence(&raw))
            .with_context(|| format!("malformed condensation payload: {raw}"))?;

        let bounded = enforce_char_budget(reply.summary.trim(), SUMMARY_CHAR_BUDGET);
        let (summary_text, complete) = truncate_to_sentence(&bounded);
        if !complete {
            tracing::warn!(
                summary = %summary_text,
                "condensed text has no sentence terminator, keeping as-is"
            );
        }

        let mut keywords: Vec<String> = reply
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        keywords.truncate(MAX_KEYWORDS);

        tracing::info!(chars = summary_text.chars().count(), keywords = ?keywords, "condensation ready");
        Ok(Condensation {
            summary_text,
            keywords,
        })
    }
}

/// Cut the text back to its last sentence terminator. Returns the text plus
/// whether it ends on a complete sentence. Text without any terminator is
/// passed through unchanged (a quality concern, not an error).
pub fn truncate_to_sentence(text: &str) -> (String, bool) {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return (String::new(), false);
    }
    if trimmed.ends_with(['.', '!', '?']) {
        return (trimmed.to_string(), true);
    }
    match trimmed.rfind(['.', '!', '?']) {
        Some(pos) => {
            let end = pos + 1; // terminators are single-byte
            (trimmed[..end].trim_end().to_string(), true)
        }
        None => (trimmed.to_string(), false),
    }
}

fn enforce_char_budget(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    tracing::warn!(budget, "condensed text over budget, truncating");
    text.chars().take(budget).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;

    #[test]
    fn complete_text_is_untouched() {
        let (out, complete) = truncate_to_sentence("One. Two.");
        assert_eq!(out, "One. Two.");
        assert!(complete);
    }

    #[test]
    fn dangling_clause_is_cut_at_last_terminator() {
        let (out, complete) = truncate_to_sentence("One. Two. And then the");
        assert_eq!(out, "One. Two.");
        assert!(complete);
    }

    #[test]
    fn question_and_exclamation_count_as_terminators() {
        let (out, complete) = truncate_to_sentence("Really? Yes! maybe more");
        assert_eq!(out, "Really? Yes!");
        assert!(complete);
    }

    #[test]
    fn text_without_terminator_is_kept() {
        let (out, complete) = truncate_to_sentence("no terminator here");
        assert_eq!(out, "no terminator here");
        assert!(!complete);
    }

    #[test]
    fn over_budget_text_is_cut_to_budget() {
        let long = "a".repeat(300);
        assert_eq!(enforce_char_budget(&long, 240).chars().count(), 240);
    }

    struct OneShot(Result<&'static str, ()>);

    #[async_trait]
    impl ReasoningClient for OneShot {
        async fn complete(&self, _req: CompletionRequest<'_>) -> Result<String> {
            match self.0 {
                Ok(s) => Ok(s.to_string()),
                Err(()) => Err(anyhow!("boom")),
            }
        }
        fn provider_name(&self) -> &'static str {
            "oneshot"
        }
    }

    fn record() -> NewsRecord {
        NewsRecord {
            title: "Parliament approves the bill".into(),
            body_text: "The parliament approved the bill today.".into(),
            published_at: Utc::now(),
            source_name: "PAP".into(),
            category: "politics".into(),
            locale_tag: "pl".into(),
        }
    }

    #[tokio::test]
    async fn parses_summary_and_clamps_keywords() {
        let reply = r#"{"summary": "Meclis yasayı onayladı. Yasa 1 Ocak'ta yürürlüğe girecek",
            "keywords": ["hükümet", "yasa", "göçmen", "ekonomi", "vergi", "fazladan"]}"#;
        let c = Condenser::new(Arc::new(OneShot(Ok(reply))));
        let out = c.condense(&record()).await.unwrap();
        // dangling second sentence is cut back to the terminator
        assert_eq!(out.summary_text, "Meclis yasayı onayladı.");
        assert_eq!(out.keywords.len(), 5);
    }

    #[tokio::test]
    async fn service_error_is_a_hard_failure() {
        let c = Condenser::new(Arc::new(OneShot(Err(()))));
        assert!(c.condense(&record()).await.is_err());
    }

    #[tokio::test]
    async fn unparsable_payload_is_a_hard_failure() {
        let c = Condenser::new(Arc::new(OneShot(Ok("not json at all"))));
        assert!(c.condense(&record()).await.is_err());
    }
}
