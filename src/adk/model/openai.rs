// SPDX-License-Identifier: MIT

//! OpenAI chat completions client

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::{ModelError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::env;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    /// Comparator replies are parsed as JSON
    response_format: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
    finish_reason: Option<String>,
}

pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIModel {
    /// Reads `OPENAI_API_KEY` and optionally `OPENAI_BASE_URL`
    pub fn new(model_name: String) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("openai".to_string()))?;
        let base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        Ok(Self {
            client: Client::new(),
            api_key,
            model_name,
            base_url,
        })
    }

    fn to_message(turn: &Content) -> ChatMessage {
        let role = match turn.role.as_str() {
            "model" => "assistant",
            other => other,
        };
        ChatMessage {
            role: role.to_string(),
            content: Some(turn.joined_text()),
        }
    }

    fn build_request<'a>(
        &'a self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model_name,
            messages: history.iter().map(Self::to_message).collect(),
            response_format: json!({ "type": "json_object" }),
            temperature: config.and_then(|c| c.temperature),
            max_tokens: config.and_then(|c| c.max_output_tokens),
            top_p: config.and_then(|c| c.top_p),
        }
    }

    fn first_choice(response: ChatResponse) -> Result<Content> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            ModelError::InvalidResponse("No choices in OpenAI response".to_string())
        })?;

        if let Some(reason) = &choice.finish_reason {
            log::debug!("OpenAI finish reason: {}", reason);
        }

        let parts = choice
            .message
            .content
            .filter(|c| !c.is_empty())
            .map(|c| vec![Part::Text(c)])
            .unwrap_or_default();

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content> {
        let request = self.build_request(history, config);
        log::debug!("OpenAI request for {}", self.model_name);

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::Api {
                provider: "OpenAI".to_string(),
                message: format!("{}: {}", status, resp.text().await?),
            }
            .into());
        }

        let body = resp.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::InvalidResponse(format!("OpenAI: {}", e)))?;

        Self::first_choice(parsed)
    }
}
