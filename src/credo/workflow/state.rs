// SPDX-License-Identifier: MIT

//! Verification state threaded through the workflow graph

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adk::error::{CredoError, FailureKind};
use crate::credo::directory::{Discrepancy, ProviderRecord};

/// Routing outcome of a verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    #[default]
    Pending,
    UpdateDatabase,
    FlagForReview,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Pending => "pending",
            Decision::UpdateDatabase => "update_database",
            Decision::FlagForReview => "flag_for_review",
        }
    }
}

/// Position of a run in the verification state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Start,
    Fetched,
    Scraped,
    QaDone,
    Updated,
    Flagged,
    Failed,
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Updated | Stage::Flagged | Stage::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Fetched => "fetched",
            Stage::Scraped => "scraped",
            Stage::QaDone => "qa_done",
            Stage::Updated => "updated",
            Stage::Flagged => "flagged",
            Stage::Failed => "failed",
        }
    }
}

/// Why a run ended in [`Stage::Failed`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub node: String,
    pub kind: FailureKind,
    pub message: String,
}

/// The record threaded through every node of one verification run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    provider_id: String,
    pub stage: Stage,
    pub database_record: Option<ProviderRecord>,
    pub scraped_record: Option<ProviderRecord>,
    pub confidence_score: Option<u8>,
    pub discrepancies: Vec<Discrepancy>,
    pub decision: Decision,
    pub status_log: Vec<String>,
    /// Node ids in execution order
    pub steps: Vec<String>,
    pub failure: Option<Failure>,
}

impl WorkflowState {
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into().trim().to_string(),
            stage: Stage::Start,
            database_record: None,
            scraped_record: None,
            confidence_score: None,
            discrepancies: Vec::new(),
            decision: Decision::Pending,
            status_log: Vec::new(),
            steps: Vec::new(),
            failure: None,
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// Append a status message
    pub fn log(&mut self, message: impl Into<String>) {
        self.status_log.push(message.into());
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Move to [`Stage::Failed`], recording the failing node and error
    pub fn fail(mut self, node: &str, error: &CredoError) -> Self {
        self.stage = Stage::Failed;
        self.log(format!("[{}] failed: {}", node, error));
        self.failure = Some(Failure {
            node: node.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        });
        self
    }

    /// JSON view used by route conditions (`confidence_score > 80`, `stage == 'qa_done'`)
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
