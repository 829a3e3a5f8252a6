// SPDX-License-Identifier: MIT

//! Route conditions for conditional edges
//!
//! Conditions are expression trees evaluated against the JSON view of a
//! workflow state, e.g. `not (confidence_score > 80)`.

mod ast;
mod evaluator;

pub use ast::{CompareOp, Expression, Literal};
pub use evaluator::evaluate;
