//! Configuration for the FFmpeg backend.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the FFmpeg-based audio/video backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FfmpegConfig {
    /// Install the backend for the audio and video families.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Directory where inputs are staged and outputs written.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Maximum parallel ffmpeg processes.
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Additional arguments placed before the output path.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("fileforge-ffmpeg")
}

fn default_max_parallel() -> usize {
    1
}

fn default_log_level() -> String {
    "warning".to_string()
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ffmpeg_path: default_ffmpeg_path(),
            work_dir: default_work_dir(),
            max_parallel: default_max_parallel(),
            log_level: default_log_level(),
            extra_args: Vec::new(),
        }
    }
}

impl FfmpegConfig {
    pub fn with_ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }
}
