//! Verification workflow nodes
//!
//! Every node takes the state by value and hands back the next state. A node
//! only reads fields populated by the nodes before it; reading ahead is a
//! [`WorkflowError::MissingPrerequisite`].

use async_trait::async_trait;
use std::sync::Arc;

use super::state::{Decision, Stage, WorkflowState};
use crate::adk::error::{CredoError, Result, WorkflowError};
use crate::credo::directory::{Comparator, ProviderRecord, ProviderSource, WebSource};

pub const FETCH_PROVIDER: &str = "fetch_provider";
pub const SCRAPE_WEB: &str = "scrape_web";
pub const QUALITY_ASSURANCE: &str = "quality_assurance";
pub const UPDATE_DATABASE: &str = "update_database";
pub const FLAG_FOR_REVIEW: &str = "flag_for_review";

/// A step of the verification graph
#[async_trait]
pub trait Node: Send + Sync {
    fn id(&self) -> &str;

    async fn run(&self, state: WorkflowState) -> Result<WorkflowState>;
}

fn require<'s, T>(node: &str, field: &str, value: &'s Option<T>) -> Result<&'s T> {
    value.as_ref().ok_or_else(|| {
        WorkflowError::MissingPrerequisite {
            node: node.to_string(),
            field: field.to_string(),
        }
        .into()
    })
}

/// Loads the stored record from the directory database
pub struct FetchProvider {
    source: Arc<dyn ProviderSource>,
}

impl FetchProvider {
    pub fn new(source: Arc<dyn ProviderSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Node for FetchProvider {
    fn id(&self) -> &str {
        FETCH_PROVIDER
    }

    async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let record = self.source.fetch(state.provider_id()).await?;
        state.log(format!(
            "[{}] Retrieved provider {} from {}",
            FETCH_PROVIDER,
            state.provider_id(),
            self.source.name()
        ));
        state.database_record = Some(record);
        state.stage = Stage::Fetched;
        Ok(state)
    }
}

/// Retrieves the independently published record
pub struct ScrapeWeb {
    source: Arc<dyn WebSource>,
}

impl ScrapeWeb {
    pub fn new(source: Arc<dyn WebSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Node for ScrapeWeb {
    fn id(&self) -> &str {
        SCRAPE_WEB
    }

    async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let known: &ProviderRecord = require(SCRAPE_WEB, "database_record", &state.database_record)?;
        let scraped = self.source.scrape(state.provider_id(), known).await?;
        state.log(format!(
            "[{}] Scraped web data for provider {} from {}",
            SCRAPE_WEB,
            state.provider_id(),
            self.source.name()
        ));
        state.scraped_record = Some(scraped);
        state.stage = Stage::Scraped;
        Ok(state)
    }
}

/// Compares both records and scores their agreement
pub struct QualityAssurance {
    comparator: Arc<dyn Comparator>,
}

impl QualityAssurance {
    pub fn new(comparator: Arc<dyn Comparator>) -> Self {
        Self { comparator }
    }
}

#[async_trait]
impl Node for QualityAssurance {
    fn id(&self) -> &str {
        QUALITY_ASSURANCE
    }

    async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let database = require(QUALITY_ASSURANCE, "database_record", &state.database_record)?;
        let scraped = require(QUALITY_ASSURANCE, "scraped_record", &state.scraped_record)?;

        let comparison = self
            .comparator
            .compare(state.provider_id(), database, scraped)
            .await?;

        if comparison.confidence_score > 100 {
            return Err(CredoError::upstream(
                self.comparator.name(),
                format!(
                    "confidence score {} outside 0..=100",
                    comparison.confidence_score
                ),
            ));
        }

        for d in &comparison.discrepancies {
            log::info!(
                "Provider {} {}: db='{}' vs scraped='{}'",
                state.provider_id(),
                d.field,
                d.db_value,
                d.scraped_value
            );
        }

        state.log(format!(
            "[{}] Confidence score {}% with {} discrepancies ({} comparator)",
            QUALITY_ASSURANCE,
            comparison.confidence_score,
            comparison.discrepancies.len(),
            self.comparator.name()
        ));
        state.confidence_score = Some(comparison.confidence_score);
        state.discrepancies = comparison.discrepancies;
        state.stage = Stage::QaDone;
        Ok(state)
    }
}

/// Accepts the verified record
#[derive(Debug, Default)]
pub struct UpdateDatabase;

#[async_trait]
impl Node for UpdateDatabase {
    fn id(&self) -> &str {
        UPDATE_DATABASE
    }

    async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let score = *require(UPDATE_DATABASE, "confidence_score", &state.confidence_score)?;
        state.log(format!(
            "[{}] Provider {} verified with confidence {}%",
            UPDATE_DATABASE,
            state.provider_id(),
            score
        ));
        state.decision = Decision::UpdateDatabase;
        state.stage = Stage::Updated;
        Ok(state)
    }
}

/// Queues the record for a human reviewer
#[derive(Debug, Default)]
pub struct FlagForReview;

#[async_trait]
impl Node for FlagForReview {
    fn id(&self) -> &str {
        FLAG_FOR_REVIEW
    }

    async fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let score = *require(FLAG_FOR_REVIEW, "confidence_score", &state.confidence_score)?;
        state.log(format!(
            "[{}] Provider {} flagged for human review (confidence {}%, {} discrepancies)",
            FLAG_FOR_REVIEW,
            state.provider_id(),
            score,
            state.discrepancies.len()
        ));
        state.decision = Decision::FlagForReview;
        state.stage = Stage::Flagged;
        Ok(state)
    }
}
