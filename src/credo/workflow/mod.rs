// SPDX-License-Identifier: MIT

//! Provider verification workflow
//!
//! `fetch_provider → scrape_web → quality_assurance → (update_database | flag_for_review)`

pub mod builder;
pub mod condition;
pub mod graph;
pub mod nodes;
pub mod state;

pub use builder::Builder;
pub use graph::{CompiledNode, VerificationGraph, WorkflowEvent};
pub use nodes::Node;
pub use state::{Decision, Failure, Stage, WorkflowState};
