// SPDX-License-Identifier: MIT

//! Provider directory collaborators
//!
//! - `ProviderSource` - the system of record
//! - `WebSource` - independently published provider data
//! - `Comparator` - judges agreement between the two records
//!
//! Fixture-backed implementations stand in for the real integrations.

pub mod comparator;
pub mod fixtures;
pub mod llm;
pub mod record;
pub mod sources;

pub use comparator::{Comparator, Comparison, FieldComparator, FixtureComparator};
pub use llm::LlmComparator;
pub use record::{Discrepancy, ProviderRecord};
pub use sources::{FixtureProviderSource, FixtureWebSource, ProviderSource, WebSource};
