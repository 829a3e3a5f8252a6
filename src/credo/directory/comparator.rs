//! Comparison of a database record against its independently sourced copy

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::fixtures;
use super::record::{diff_records, Discrepancy, ProviderRecord};
use crate::adk::error::{CredoError, Result};

/// Outcome of comparing two records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    /// Agreement estimate in 0..=100
    pub confidence_score: u8,
    pub discrepancies: Vec<Discrepancy>,
}

/// Reasoning service that judges how well two records agree
#[async_trait]
pub trait Comparator: Send + Sync {
    fn name(&self) -> &str;

    async fn compare(
        &self,
        provider_id: &str,
        database: &ProviderRecord,
        scraped: &ProviderRecord,
    ) -> Result<Comparison>;
}

/// Score from the discrepancy count: 0 → 95, 1 → 75, n → 100 - 20n (floored at 0)
pub fn score_from_discrepancies(count: usize) -> u8 {
    match count {
        0 => 95,
        1 => 75,
        n => 100u8.saturating_sub(u8::try_from(n.saturating_mul(20)).unwrap_or(u8::MAX)),
    }
}

/// Uses the precomputed fixture confidence as the score
#[derive(Debug, Default, Clone)]
pub struct FixtureComparator;

#[async_trait]
impl Comparator for FixtureComparator {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn compare(
        &self,
        provider_id: &str,
        database: &ProviderRecord,
        scraped: &ProviderRecord,
    ) -> Result<Comparison> {
        let fixture = fixtures::get(provider_id)
            .ok_or_else(|| CredoError::not_found(provider_id, "fixture comparator"))?;

        Ok(Comparison {
            confidence_score: fixture.confidence,
            discrepancies: diff_records(database, scraped),
        })
    }
}

/// Derives the score from the structural diff alone
#[derive(Debug, Default, Clone)]
pub struct FieldComparator;

#[async_trait]
impl Comparator for FieldComparator {
    fn name(&self) -> &str {
        "field"
    }

    async fn compare(
        &self,
        _provider_id: &str,
        database: &ProviderRecord,
        scraped: &ProviderRecord,
    ) -> Result<Comparison> {
        let discrepancies = diff_records(database, scraped);
        Ok(Comparison {
            confidence_score: score_from_discrepancies(discrepancies.len()),
            discrepancies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(id: &str) -> (ProviderRecord, ProviderRecord) {
        let f = fixtures::get(id).unwrap();
        (f.database.clone(), f.scraped.clone())
    }

    #[test]
    fn test_score_from_discrepancies() {
        assert_eq!(score_from_discrepancies(0), 95);
        assert_eq!(score_from_discrepancies(1), 75);
        assert_eq!(score_from_discrepancies(2), 60);
        assert_eq!(score_from_discrepancies(4), 20);
        assert_eq!(score_from_discrepancies(5), 0);
        assert_eq!(score_from_discrepancies(9), 0);
        assert_eq!(score_from_discrepancies(usize::MAX), 0);
    }

    #[tokio::test]
    async fn test_fixture_comparator_keeps_constant_score() {
        let (db, scraped) = pair("2001");
        let result = FixtureComparator.compare("2001", &db, &scraped).await.unwrap();
        assert_eq!(result.confidence_score, 78);
        assert_eq!(result.discrepancies.len(), 1);
        assert_eq!(result.discrepancies[0].field, "phone");
    }

    #[tokio::test]
    async fn test_fixture_comparator_unknown_id() {
        let (db, scraped) = pair("1001");
        assert!(FixtureComparator.compare("5555", &db, &scraped).await.is_err());
    }

    #[tokio::test]
    async fn test_field_comparator_scores_diff() {
        let (db, scraped) = pair("3001");
        let result = FieldComparator.compare("3001", &db, &scraped).await.unwrap();
        assert_eq!(result.discrepancies.len(), 2);
        assert_eq!(result.confidence_score, 60);

        let (db, scraped) = pair("1003");
        let result = FieldComparator.compare("1003", &db, &scraped).await.unwrap();
        assert_eq!(result.confidence_score, 95);
    }
}
