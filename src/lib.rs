pub mod adk;
pub mod credo;
