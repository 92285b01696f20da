use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

use crate::backend::FfmpegConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::progress::ProgressBands;
use crate::request::RequestLimits;
use crate::retention::RetentionSettings;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub ffmpeg: FfmpegConfig,
}

impl Config {
    /// Settings for the batch orchestrator.
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            limits: RequestLimits {
                max_file_size_bytes: self.limits.max_file_size_bytes,
                warn_file_size_bytes: self.limits.warn_file_size_bytes,
            },
            bands: ProgressBands {
                staging: self.progress.staging_percent,
                work_end: self.progress.work_end_percent,
            },
            channel_capacity: self.progress.channel_capacity,
        }
    }

    /// Initial retention policy. Adjustable at runtime afterwards.
    pub fn retention_settings(&self) -> RetentionSettings {
        RetentionSettings {
            enabled: self.retention.enabled,
            window_minutes: self.retention.window_minutes,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Input size limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Larger inputs are rejected before a job is created.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Larger inputs are accepted with a warning.
    #[serde(default = "default_warn_file_size")]
    pub warn_file_size_bytes: u64,
    /// Most files accepted in one batch upload.
    #[serde(default = "default_max_batch_files")]
    pub max_batch_files: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            warn_file_size_bytes: default_warn_file_size(),
            max_batch_files: default_max_batch_files(),
        }
    }
}

fn default_max_file_size() -> u64 {
    2 * 1024 * 1024 * 1024 // 2 GiB
}

fn default_warn_file_size() -> u64 {
    500 * 1024 * 1024 // 500 MiB
}

fn default_max_batch_files() -> u64 {
    100
}

/// Retention of completed jobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl RetentionConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            window_minutes: default_window_minutes(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_window_minutes() -> u64 {
    5
}

fn default_sweep_interval() -> u64 {
    30
}

/// Progress reporting
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProgressConfig {
    /// End of the staging band.
    #[serde(default = "default_staging_percent")]
    pub staging_percent: u8,
    /// End of the backend work band.
    #[serde(default = "default_work_end_percent")]
    pub work_end_percent: u8,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            staging_percent: default_staging_percent(),
            work_end_percent: default_work_end_percent(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_staging_percent() -> u8 {
    10
}

fn default_work_end_percent() -> u8 {
    95
}

fn default_channel_capacity() -> usize {
    64
}

/// Conversion history
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Records buffered between the orchestrator and the writer.
    #[serde(default = "default_history_buffer")]
    pub buffer_size: usize,
    /// Recent records kept in memory.
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_history_buffer(),
            capacity: default_history_capacity(),
        }
    }
}

fn default_history_buffer() -> usize {
    1000
}

fn default_history_capacity() -> usize {
    50
}
