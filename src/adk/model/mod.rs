// SPDX-License-Identifier: MIT

//! Model module - defines the LLM model trait and implementations
//!
//! The reasoning comparator talks to an LLM through the [`Model`] trait.
//! Implementations live in their own submodules:
//! - [anthropic] - Anthropic's Claude API
//! - [openai] - OpenAI's chat completions API

pub mod anthropic;
pub mod openai;

use crate::adk::error::{ModelError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts, ignoring thinking blocks
    pub fn joined_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::Thinking(_) => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Parts of a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Thinking/reasoning content from thinking models
    Thinking(String),
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content>;
}

/// Build a model for a provider name ("anthropic" or "openai")
pub fn from_provider(provider: &str, model_name: &str) -> Result<Arc<dyn Model>> {
    match provider.to_ascii_lowercase().as_str() {
        "anthropic" => Ok(Arc::new(anthropic::AnthropicModel::new(
            model_name.to_string(),
        )?)),
        "openai" => Ok(Arc::new(openai::OpenAIModel::new(model_name.to_string())?)),
        other => Err(ModelError::UnsupportedProvider(other.to_string()).into()),
    }
}
