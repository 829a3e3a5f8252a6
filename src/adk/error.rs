// SPDX-License-Identifier: MIT

//! Typed error handling for credo-rs
//!
//! `CredoError` is the crate-wide error. Workflow construction problems and
//! LLM backend problems have their own enums and convert into it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for credo-rs
#[derive(Debug, Error)]
pub enum CredoError {
    /// The provider is unknown to a record source
    #[error("Provider '{provider_id}' not found in {source_name}")]
    NotFound {
        provider_id: String,
        source_name: String,
    },

    /// A scrape or reasoning service could not produce a result
    #[error("Upstream service '{service}' unavailable: {message}")]
    UpstreamUnavailable { service: String, message: String },

    /// Request rejected before the workflow ran
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors (bad env vars, invalid config file values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workflow-specific errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Model/LLM-specific errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Workflow-specific errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Two nodes registered under the same id
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    /// A node depends on an id that is not part of the graph
    #[error("Node '{node}' depends on unknown node '{dependency}'")]
    UnknownDependency { node: String, dependency: String },

    /// Circular dependency detected in the graph
    #[error("Circular dependency detected: {0:?}")]
    CircularDependency(Vec<String>),

    /// A node ran before the field it reads was populated
    #[error("Node '{node}' requires '{field}' which is not populated yet")]
    MissingPrerequisite { node: String, field: String },

    /// No branch guard matched after the last non-terminal node
    #[error("No route taken from stage '{0}'")]
    NoRoute(String),

    /// Execution exceeded the iteration safety limit
    #[error("Max iterations reached: {0}")]
    MaxIterations(u32),
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Provider not supported
    #[error("Model provider not supported: {0}")]
    UnsupportedProvider(String),

    /// Non-success status from the provider API
    #[error("{provider} API error: {message}")]
    Api { provider: String, message: String },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),
}

/// Coarse classification of a failure, recorded in a failed workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    UpstreamUnavailable,
    Internal,
}

impl CredoError {
    /// Create a not-found error
    pub fn not_found(provider_id: impl Into<String>, source_name: impl Into<String>) -> Self {
        Self::NotFound {
            provider_id: provider_id.into(),
            source_name: source_name.into(),
        }
    }

    /// Create an upstream-unavailable error
    pub fn upstream(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            service: service.into(),
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound { .. } => FailureKind::NotFound,
            Self::UpstreamUnavailable { .. } | Self::Http(_) => FailureKind::UpstreamUnavailable,
            _ => FailureKind::Internal,
        }
    }
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, CredoError>;
