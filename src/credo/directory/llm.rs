//! LLM-backed comparator
//!
//! Sends both records to a [`Model`] and parses a structured verdict out of
//! the reply. Any model failure or unusable reply is reported as the
//! reasoning service being unavailable.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::comparator::{Comparator, Comparison};
use super::record::{Discrepancy, ProviderRecord, COMPARED_FIELDS};
use crate::adk::error::{CredoError, Result};
use crate::adk::model::{Content, GenerationConfig, Model};

const SERVICE: &str = "reasoning service";

const INSTRUCTION: &str = "You verify healthcare provider directory entries. \
You receive a DATABASE record and a SCRAPED record for the same provider. \
Compare the fields name, specialty, phone, address, city, state, zip, license_number and npi. \
Treat formatting-only differences (case, abbreviations, an extra locality word) as matching. \
Reply with a single JSON object and nothing else: \
{\"confidence_score\": <integer 0-100>, \"discrepancies\": \
[{\"field\": <string>, \"db_value\": <string>, \"scraped_value\": <string>}]}";

#[derive(Debug, Deserialize)]
struct Verdict {
    confidence_score: f64,
    #[serde(default)]
    discrepancies: Vec<Discrepancy>,
}

/// Comparator that delegates the judgement to an LLM
pub struct LlmComparator {
    model: Arc<dyn Model>,
    config: GenerationConfig,
}

impl LlmComparator {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            config: GenerationConfig {
                temperature: Some(0.0),
                max_output_tokens: Some(1024),
                top_p: None,
            },
        }
    }

    fn build_prompt(database: &ProviderRecord, scraped: &ProviderRecord) -> String {
        let payload = json!({ "database": database, "scraped": scraped });
        format!(
            "DATABASE and SCRAPED records:\n{}",
            serde_json::to_string_pretty(&payload).unwrap_or_default()
        )
    }
}

/// Strip an optional Markdown code fence around the reply
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Info string ("json") may be followed by a newline or sit on one line with the body
    let body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Parse the model reply into a comparison
fn parse_verdict(text: &str) -> Result<Comparison> {
    let verdict: Verdict = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| CredoError::upstream(SERVICE, format!("unparseable verdict: {}", e)))?;

    if !verdict.confidence_score.is_finite() {
        return Err(CredoError::upstream(SERVICE, "non-finite confidence score"));
    }

    let discrepancies = verdict
        .discrepancies
        .into_iter()
        .filter(|d| COMPARED_FIELDS.contains(&d.field.as_str()))
        .collect();

    Ok(Comparison {
        confidence_score: verdict.confidence_score.round().clamp(0.0, 100.0) as u8,
        discrepancies,
    })
}

#[async_trait]
impl Comparator for LlmComparator {
    fn name(&self) -> &str {
        "llm"
    }

    async fn compare(
        &self,
        provider_id: &str,
        database: &ProviderRecord,
        scraped: &ProviderRecord,
    ) -> Result<Comparison> {
        let history = vec![
            Content::text("system", INSTRUCTION),
            Content::text("user", Self::build_prompt(database, scraped)),
        ];

        log::info!("Asking model to compare records for provider {}", provider_id);

        let reply = self
            .model
            .generate_content(&history, Some(&self.config))
            .await
            .map_err(|e| CredoError::upstream(SERVICE, e.to_string()))?;

        let text = reply.joined_text();
        log::debug!("Model verdict for {}: {}", provider_id, text);

        parse_verdict(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn test_single_line_fence() {
        assert_eq!(strip_code_fence("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json {\"a\":1} ```"), "{\"a\":1}");

        let c = parse_verdict(r#"```{"confidence_score": 91}```"#).unwrap();
        assert_eq!(c.confidence_score, 91);
    }

    #[test]
    fn test_parse_verdict_clamps_and_rounds() {
        let c = parse_verdict(r#"{"confidence_score": 140}"#).unwrap();
        assert_eq!(c.confidence_score, 100);
        let c = parse_verdict(r#"{"confidence_score": -3}"#).unwrap();
        assert_eq!(c.confidence_score, 0);
        let c = parse_verdict(r#"{"confidence_score": 80.6}"#).unwrap();
        assert_eq!(c.confidence_score, 81);
    }

    #[test]
    fn test_parse_verdict_drops_unknown_fields() {
        let c = parse_verdict(
            r#"{"confidence_score": 70, "discrepancies": [
                {"field": "phone", "db_value": "1", "scraped_value": "2"},
                {"field": "email", "db_value": "a", "scraped_value": "b"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(c.discrepancies.len(), 1);
        assert_eq!(c.discrepancies[0].field, "phone");
    }

    #[test]
    fn test_parse_verdict_rejects_prose() {
        let err = parse_verdict("The records look similar.").unwrap_err();
        assert!(matches!(err, CredoError::UpstreamUnavailable { .. }));
    }

    #[test]
    fn test_prompt_contains_both_records() {
        let f = crate::credo::directory::fixtures::get("2001").unwrap();
        let prompt = LlmComparator::build_prompt(&f.database, &f.scraped);
        assert!(prompt.contains("+91-40-2789-4567"));
        assert!(prompt.contains("+91-40-2789-4568"));
    }
}
