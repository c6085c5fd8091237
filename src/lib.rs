//! sdw-etl - a small extract/transform/load pipeline
//!
//! Reads user ids from a CSV file, fetches each user from a public users API,
//! asks an OpenAI-compatible model for a short personalized investment
//! message, stores every updated record as its own JSON file and finishes
//! with a summary report.

pub mod advisor;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod llm;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod users;

pub use cli::Args;
pub use pipeline::{Pipeline, RunOutcome, RunSettings};
