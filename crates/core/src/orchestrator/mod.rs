//! Batch orchestrator for conversion jobs.
//!
//! The orchestrator drives jobs through the state machine:
//! - **Direct conversions**: one job each, may run concurrently
//! - **Batches**: sequential (one job at a time), with a single in-progress flag

mod batch;
mod config;
mod types;

pub use batch::BatchOrchestrator;
pub use config::OrchestratorConfig;
pub use types::{BatchAccepted, BatchRejection, BatchReport, BatchStatus, OrchestratorError};
