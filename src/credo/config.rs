// SPDX-License-Identifier: MIT

//! Verifier configuration
//!
//! Precedence, lowest first: defaults, YAML file, environment (including a
//! `.env` file loaded by the binary), command-line flags.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::adk::error::{CredoError, Result};

pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 80;

/// Which reasoning service scores record agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparatorKind {
    /// Precomputed fixture confidence
    #[default]
    Fixture,
    /// Score derived from the number of field discrepancies
    Field,
    /// LLM judgement
    Llm,
}

impl FromStr for ComparatorKind {
    type Err = CredoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixture" => Ok(Self::Fixture),
            "field" => Ok(Self::Field),
            "llm" => Ok(Self::Llm),
            other => Err(CredoError::config(format!(
                "unknown comparator '{}' (expected fixture, field or llm)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// "anthropic" or "openai"
    pub provider: String,
    pub name: String,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            name: "claude-3-5-haiku-latest".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    /// Scores strictly above this route to a database update
    pub confidence_threshold: u8,
    pub comparator: ComparatorKind,
    pub model: ModelSettings,
    pub server: ServerSettings,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            comparator: ComparatorKind::default(),
            model: ModelSettings::default(),
            server: ServerSettings::default(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| CredoError::config(format!("{} has invalid value '{}'", name, raw)))
}

impl VerifierConfig {
    /// Parse a YAML document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()
    }

    /// Load a YAML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Defaults or file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_overrides(|name| env::var(name).ok())
    }

    /// Apply overrides from a variable lookup (the process environment in `load`)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CREDO_CONFIDENCE_THRESHOLD") {
            self.confidence_threshold = parse_var("CREDO_CONFIDENCE_THRESHOLD", &raw)?;
        }
        if let Some(raw) = lookup("CREDO_COMPARATOR") {
            self.comparator = raw.parse()?;
        }
        if let Some(provider) = lookup("MODEL_PROVIDER") {
            self.model.provider = provider.trim().to_ascii_lowercase();
        }
        if let Some(name) = lookup("CREDO_MODEL") {
            self.model.name = name.trim().to_string();
        }
        if let Some(host) = lookup("CREDO_HOST") {
            self.server.host = host.trim().to_string();
        }
        if let Some(raw) = lookup("CREDO_PORT") {
            self.server.port = parse_var("CREDO_PORT", &raw)?;
        }
        self.validate()
    }

    pub fn validate(self) -> Result<Self> {
        if self.confidence_threshold > 100 {
            return Err(CredoError::config(format!(
                "confidence_threshold must be within 0..=100, got {}",
                self.confidence_threshold
            )));
        }
        if self.comparator == ComparatorKind::Llm && self.model.name.is_empty() {
            return Err(CredoError::config("llm comparator needs a model name"));
        }
        Ok(self)
    }
}
