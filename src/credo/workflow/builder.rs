// SPDX-License-Identifier: MIT

//! Assembles the verification graph from its collaborators

use std::sync::Arc;

use super::condition::{CompareOp, Expression};
use super::graph::{CompiledNode, VerificationGraph};
use super::nodes::{
    FetchProvider, FlagForReview, QualityAssurance, ScrapeWeb, UpdateDatabase, FETCH_PROVIDER,
    QUALITY_ASSURANCE, SCRAPE_WEB,
};
use crate::adk::error::{CredoError, Result};
use crate::adk::model;
use crate::credo::config::{ComparatorKind, VerifierConfig, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::credo::directory::{
    Comparator, FieldComparator, FixtureComparator, FixtureProviderSource, FixtureWebSource,
    LlmComparator, ProviderSource, WebSource,
};

pub const GRAPH_NAME: &str = "provider_verification";

/// Condition for the auto-update branch: `confidence_score > threshold`
pub fn update_condition(threshold: u8) -> Expression {
    Expression::compare("confidence_score", CompareOp::Gt, threshold)
}

/// Builds the fetch → scrape → QA → (update | flag) graph
pub struct Builder {
    provider_source: Arc<dyn ProviderSource>,
    web_source: Arc<dyn WebSource>,
    comparator: Arc<dyn Comparator>,
    threshold: u8,
}

impl Builder {
    /// Fixture-backed collaborators and the default threshold
    pub fn new() -> Self {
        Self {
            provider_source: Arc::new(FixtureProviderSource),
            web_source: Arc::new(FixtureWebSource),
            comparator: Arc::new(FixtureComparator),
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    pub fn from_config(config: &VerifierConfig) -> Result<Self> {
        let comparator: Arc<dyn Comparator> = match config.comparator {
            ComparatorKind::Fixture => Arc::new(FixtureComparator),
            ComparatorKind::Field => Arc::new(FieldComparator),
            ComparatorKind::Llm => {
                log::info!(
                    "Using {} model {} for comparisons",
                    config.model.provider,
                    config.model.name
                );
                let model = model::from_provider(&config.model.provider, &config.model.name)?;
                Arc::new(LlmComparator::new(model))
            }
        };

        Ok(Self::new()
            .with_comparator(comparator)
            .with_threshold(config.confidence_threshold)?)
    }

    pub fn with_provider_source(mut self, source: Arc<dyn ProviderSource>) -> Self {
        self.provider_source = source;
        self
    }

    pub fn with_web_source(mut self, source: Arc<dyn WebSource>) -> Self {
        self.web_source = source;
        self
    }

    pub fn with_comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_threshold(mut self, threshold: u8) -> Result<Self> {
        if threshold > 100 {
            return Err(CredoError::config(format!(
                "confidence threshold must be within 0..=100, got {}",
                threshold
            )));
        }
        self.threshold = threshold;
        Ok(self)
    }

    pub fn build(self) -> Result<VerificationGraph> {
        let update_when = update_condition(self.threshold);
        let flag_when = update_when.clone().negate();

        VerificationGraph::new(
            GRAPH_NAME,
            vec![
                CompiledNode::entry(Arc::new(FetchProvider::new(self.provider_source))),
                CompiledNode::after(Arc::new(ScrapeWeb::new(self.web_source)), FETCH_PROVIDER),
                CompiledNode::after(Arc::new(QualityAssurance::new(self.comparator)), SCRAPE_WEB),
                CompiledNode::after(Arc::new(UpdateDatabase), QUALITY_ASSURANCE).when(update_when),
                CompiledNode::after(Arc::new(FlagForReview), QUALITY_ASSURANCE).when(flag_when),
            ],
        )
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
