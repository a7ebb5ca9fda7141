// src/analyze/selector.rs
//! Item selector: asks the reasoning service to pick the single most
//! important record out of a bounded candidate list. Selection never fails
//! the run; every malformed outcome degrades to the first candidate with a
//! distinct logged reason so real service outages are distinguishable from
//! bad payloads in the logs.

use serde::Deserialize;
use std::sync::Arc;

use crate::analyze::ai_client::{strip_code_fence, CompletionRequest, ReasoningClient};
use crate::ingest::types::NewsRecord;

/// Upper bound on candidates sent to the service (bounds prompt size).
pub const MAX_CANDIDATES: usize = 15;
/// Per-candidate body truncation inside the prompt.
const CANDIDATE_BODY_LIMIT: usize = 500;

const SYSTEM_PROMPT: &str =
    "You are a news editor. Reply with JSON only, no prose, no code fences.";

const SELECTION_INSTRUCTIONS: &str = "\
You are an experienced news editor choosing the single most important item \
for Turkish immigrants living in Poland.

Priority order (highest first):
1. Country-wide political or economic decisions
2. News directly affecting immigrants or refugees
3. Legal changes, visa and residence-permit rules
4. Economic news (inflation, minimum wage, taxes)
5. Security and public-health news
6. Social events

Down-rank: sports, entertainment, purely local events without country-wide \
impact. Prefer the item with the highest severity, the widest affected \
audience, and the most urgency (laws entering into force, approaching \
deadlines).

ANALYZE THESE ITEMS:
";

const RESPONSE_FORMAT: &str = r#"
Respond with exactly this JSON object:
{
    "selected_index": <zero-based index of the chosen item>,
    "reason": "<one short sentence explaining the choice>",
    "importance_score": <integer 1-10>
}"#;

/// Outcome of a selection round. `chosen_index` always points into the
/// candidate list that was passed in.
#[derive(Debug, Clone)]
pub struct Selection {
    pub chosen_index: usize,
    pub rationale: String,
    pub importance_score: u8,
}

#[derive(Deserialize)]
struct SelectorReply {
    selected_index: i64,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    importance_score: Option<i64>,
}

pub struct Selector {
    client: Arc<dyn ReasoningClient>,
}

impl Selector {
    pub fn new(client: Arc<dyn ReasoningClient>) -> Self {
        Self { client }
    }

    /// Pick one record out of a non-empty candidate list. Infallible by
    /// contract: any problem resolves to the first candidate.
    pub async fn select(&self, candidates: &[NewsRecord]) -> Selection {
        assert!(!candidates.is_empty(), "selector needs at least one candidate");

        if candidates.len() == 1 {
            tracing::info!("single candidate, selected without a service call");
            return Selection {
                chosen_index: 0,
                rationale: "only candidate".to_string(),
                importance_score: 10,
            };
        }

        let prompt = render_prompt(candidates);
        let raw = match self
            .client
            .complete(CompletionRequest {
                system: SYSTEM_PROMPT,
                user: &prompt,
                temperature: 0.3,
                max_tokens: 500,
            })
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = ?e, "reasoning service unavailable, selecting first candidate");
                return fallback_selection("service unavailable");
            }
        };

        let reply: SelectorReply = match serde_json::from_str(strip_code_fence(&raw)) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, raw = %raw, "malformed selection payload, selecting first candidate");
                return fallback_selection("malformed selection payload");
            }
        };

        let index = reply.selected_index;
        if index < 0 || index as usize >= candidates.len() {
            tracing::warn!(index, "selection index out of range, selecting first candidate");
            return fallback_selection("selection index out of range");
        }

        let score = reply.importance_score.unwrap_or(5).clamp(1, 10) as u8;
        let rationale = reply.reason.unwrap_or_default();
        tracing::info!(
            index,
            score,
            rationale = %rationale,
            title = %candidates[index as usize].title,
            "selected news item"
        );
        Selection {
            chosen_index: index as usize,
            rationale,
            importance_score: score,
        }
    }
}

fn fallback_selection(reason: &str) -> Selection {
    Selection {
        chosen_index: 0,
        rationale: format!("degraded to first candidate: {reason}"),
        importance_score: 1,
    }
}

fn render_prompt(candidates: &[NewsRecord]) -> String {
    let mut out = String::from(SELECTION_INSTRUCTIONS);
    for (i, rec) in candidates.iter().enumerate() {
        let mut body: String = rec.body_text.chars().take(CANDIDATE_BODY_LIMIT).collect();
        if rec.body_text.chars().count() > CANDIDATE_BODY_LIMIT {
            body.push_str("...");
        }
        out.push_str(&format!(
            "\n---\n[{i}] TITLE: {}\nDATE: {}\nSOURCE: {}\nCATEGORY: {}\nBODY: {}\n---\n",
            rec.title,
            rec.published_at.to_rfc3339(),
            rec.source_name,
            rec.category,
            body
        ));
    }
    out.push_str(RESPONSE_FORMAT);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedClient {
        reply: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn ok(reply: &'static str) -> Self {
            Self {
                reply: Ok(reply),
                calls: AtomicUsize::new(0),
            }
        }
        fn failing() -> Self {
            Self {
                reply: Err(()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ReasoningClient for ScriptedClient {
        async fn complete(&self, _req: CompletionRequest<'_>) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Ok(s) => Ok(s.to_string()),
                Err(()) => Err(anyhow!("boom")),
            }
        }
        fn provider_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn records(n: usize) -> Vec<NewsRecord> {
        (0..n)
            .map(|i| NewsRecord {
                title: format!("title {i}"),
                body_text: format!("body {i}"),
                published_at: Utc::now(),
                source_name: "PAP".into(),
                category: "politics".into(),
                locale_tag: "pl".into(),
            })
            .collect()
    }

    #[tokio::test]
    async fn single_candidate_short_circuits_without_service_call() {
        let client = Arc::new(ScriptedClient::failing());
        let selector = Selector::new(client.clone());
        let sel = selector.select(&records(1)).await;
        assert_eq!(sel.chosen_index, 0);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_reply_is_honored() {
        let client = Arc::new(ScriptedClient::ok(
            r#"{"selected_index": 2, "reason": "widest impact", "importance_score": 8}"#,
        ));
        let sel = Selector::new(client).select(&records(3)).await;
        assert_eq!(sel.chosen_index, 2);
        assert_eq!(sel.importance_score, 8);
        assert_eq!(sel.rationale, "widest impact");
    }

    #[tokio::test]
    async fn fenced_reply_is_unwrapped() {
        let client = Arc::new(ScriptedClient::ok(
            "```json\n{\"selected_index\": 1, \"reason\": \"r\", \"importance_score\": 6}\n```",
        ));
        let sel = Selector::new(client).select(&records(3)).await;
        assert_eq!(sel.chosen_index, 1);
    }

    #[tokio::test]
    async fn out_of_range_index_degrades_to_first() {
        let client = Arc::new(ScriptedClient::ok(
            r#"{"selected_index": 7, "reason": "r", "importance_score": 6}"#,
        ));
        let sel = Selector::new(client).select(&records(3)).await;
        assert_eq!(sel.chosen_index, 0);
    }

    #[tokio::test]
    async fn negative_index_degrades_to_first() {
        let client = Arc::new(ScriptedClient::ok(
            r#"{"selected_index": -1, "reason": "r", "importance_score": 6}"#,
        ));
        let sel = Selector::new(client).select(&records(3)).await;
        assert_eq!(sel.chosen_index, 0);
    }

    #[tokio::test]
    async fn unparsable_reply_degrades_to_first() {
        let client = Arc::new(ScriptedClient::ok("the best item is number two"));
        let sel = Selector::new(client).select(&records(3)).await;
        assert_eq!(sel.chosen_index, 0);
    }

    #[tokio::test]
    async fn service_error_degrades_to_first() {
        let client = Arc::new(ScriptedClient::failing());
        let sel = Selector::new(client).select(&records(3)).await;
        assert_eq!(sel.chosen_index, 0);
    }

    #[test]
    fn prompt_truncates_long_bodies() {
        let mut recs = records(2);
        recs[0].body_text = "x".repeat(900);
        let prompt = render_prompt(&recs);
        assert!(prompt.contains(&format!("{}...", "x".repeat(500))));
        assert!(!prompt.contains(&"x".repeat(501)));
    }
}
