//! Anthropic messages API client

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::{ModelError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Thinking { thinking: String },
    #[serde(other)]
    Other,
}

/// Claude over the Anthropic messages API
pub struct AnthropicModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl AnthropicModel {
    /// Reads `ANTHROPIC_API_KEY` and optionally `ANTHROPIC_BASE_URL`
    pub fn new(model_name: String) -> Result<Self> {
        let api_key = env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("anthropic".to_string()))?;
        let base_url = env::var("ANTHROPIC_BASE_URL")
            .unwrap_or_else(|_| "https://api.anthropic.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    fn build_request<'a>(
        &'a self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> MessagesRequest<'a> {
        let mut system = None;
        let mut messages = Vec::new();

        for turn in history {
            let text = turn.joined_text();
            match turn.role.as_str() {
                "system" => system = Some(text),
                _ if text.is_empty() => {}
                "model" | "assistant" => messages.push(Message {
                    role: "assistant",
                    content: text,
                }),
                _ => messages.push(Message {
                    role: "user",
                    content: text,
                }),
            }
        }

        MessagesRequest {
            model: &self.model_name,
            max_tokens: config
                .and_then(|c| c.max_output_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            system,
            messages,
            temperature: config.and_then(|c| c.temperature),
            top_p: config.and_then(|c| c.top_p),
        }
    }
}

impl From<MessagesResponse> for Content {
    fn from(response: MessagesResponse) -> Self {
        let parts = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } if !text.is_empty() => Some(Part::Text(text)),
                ContentBlock::Thinking { thinking } if !thinking.is_empty() => {
                    Some(Part::Thinking(thinking))
                }
                _ => None,
            })
            .collect();

        Content {
            role: "model".to_string(),
            parts,
        }
    }
}

#[async_trait]
impl Model for AnthropicModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content> {
        let request = self.build_request(history, config);
        log::debug!(
            "Anthropic request for {} ({} turns)",
            self.model_name,
            request.messages.len()
        );

        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::Api {
                provider: "Anthropic".to_string(),
                message: format!("{}: {}", status, resp.text().await?),
            }
            .into());
        }

        let body = resp.text().await?;
        let parsed: MessagesResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::InvalidResponse(format!("Anthropic: {}", e)))?;

        if let Some(reason) = &parsed.stop_reason {
            log::debug!("Anthropic stop reason: {}", reason);
        }

        Ok(parsed.into())
    }
}
