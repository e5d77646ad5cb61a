// src/lib.rs

pub mod analysis;
pub mod config;
pub mod fetch;
pub mod join;
pub mod pipeline;
pub mod scrape;
pub mod store;

pub use config::Config;
pub use pipeline::{run, IngestDecision, RunSummary};
