//! Agent development kit: error types and LLM provider clients

pub mod error;
pub mod model;
