//! Orchestrator configuration.

use crate::progress::ProgressBands;
use crate::request::RequestLimits;

/// Settings the batch orchestrator runs with.
///
/// Assembled from the `[limits]` and `[progress]` config sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Size limits checked before a job exists.
    pub limits: RequestLimits,
    /// Progress bands applied to every job.
    pub bands: ProgressBands,
    /// Capacity of each job's progress channel.
    pub channel_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            limits: RequestLimits::default(),
            bands: ProgressBands::default(),
            channel_capacity: 64,
        }
    }
}
