//! FFmpeg backend for audio and video conversions.
//!
//! Shells out to an `ffmpeg` binary. The binary is verified lazily through a
//! [`SharedEngine`](crate::backend::SharedEngine) on first use, inputs are
//! staged into a per-conversion directory under `work_dir`, and progress is
//! parsed from `-progress pipe:2` output against the probed input duration.

mod args;
mod backend;
mod config;

pub use backend::{FfmpegBackend, FfmpegEngine, FfmpegLoader};
pub use config::FfmpegConfig;
