pub mod cli;
pub mod config;
pub mod context;
pub mod github;
pub mod logging;
pub mod message;
pub mod orchestrator;
pub mod sink;
