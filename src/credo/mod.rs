pub mod config;
pub mod directory;
pub mod server;
pub mod workflow;
