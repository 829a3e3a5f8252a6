//! Record sources: the provider directory database and the web.

use async_trait::async_trait;

use super::fixtures;
use super::record::ProviderRecord;
use crate::adk::error::{CredoError, Result};

/// The system of record for provider data
#[async_trait]
pub trait ProviderSource: Send + Sync {
    /// Name used in logs and not-found errors
    fn name(&self) -> &str;

    /// Fetch the stored record for `provider_id`
    async fn fetch(&self, provider_id: &str) -> Result<ProviderRecord>;
}

/// An independent source of the same provider facts (web listings, registries)
#[async_trait]
pub trait WebSource: Send + Sync {
    fn name(&self) -> &str;

    /// Retrieve the provider as published outside the directory.
    ///
    /// `known` is the database record, which real scrapers use to derive
    /// search terms (name, city, license number).
    async fn scrape(&self, provider_id: &str, known: &ProviderRecord) -> Result<ProviderRecord>;
}

/// Directory database backed by the fixture table
#[derive(Debug, Default, Clone)]
pub struct FixtureProviderSource;

#[async_trait]
impl ProviderSource for FixtureProviderSource {
    fn name(&self) -> &str {
        "fixture database"
    }

    async fn fetch(&self, provider_id: &str) -> Result<ProviderRecord> {
        fixtures::get(provider_id)
            .map(|f| f.database.clone())
            .ok_or_else(|| CredoError::not_found(provider_id, self.name()))
    }
}

/// Web scraper backed by the fixture table
#[derive(Debug, Default, Clone)]
pub struct FixtureWebSource;

#[async_trait]
impl WebSource for FixtureWebSource {
    fn name(&self) -> &str {
        "fixture web"
    }

    async fn scrape(&self, provider_id: &str, _known: &ProviderRecord) -> Result<ProviderRecord> {
        fixtures::get(provider_id)
            .map(|f| f.scraped.clone())
            .ok_or_else(|| CredoError::not_found(provider_id, self.name()))
    }
}
