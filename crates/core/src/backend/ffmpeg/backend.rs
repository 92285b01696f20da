//! FFmpeg-based backend for the audio and video families.

use async_trait::async_trait;
use regex_lite::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::args::build_args;
use super::config::FfmpegConfig;
use crate::backend::{
    output_file_name, BackendError, BackendRequest, ConversionBackend, ConversionOutput,
    EngineError, EngineLoader, EngineStatus, OutputFile, SharedEngine,
};
use crate::format::FormatRegistry;
use crate::progress::ProgressSink;
use crate::request::InputFile;

/// A verified ffmpeg installation.
#[derive(Debug, Clone)]
pub struct FfmpegEngine {
    pub path: PathBuf,
    pub version: String,
    pub work_dir: PathBuf,
}

/// Loads [`FfmpegEngine`] by running `ffmpeg -version` and preparing the work dir.
pub struct FfmpegLoader {
    ffmpeg_path: PathBuf,
    work_dir: PathBuf,
}

impl FfmpegLoader {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            work_dir: work_dir.into(),
        }
    }
}

#[async_trait]
impl EngineLoader for FfmpegLoader {
    type Engine = FfmpegEngine;

    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn load(&self) -> Result<FfmpegEngine, EngineError> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::load_failed(format!(
                        "FFmpeg not found at path: {}",
                        self.ffmpeg_path.display()
                    ))
                } else {
                    EngineError::load_failed(e.to_string())
                }
            })?;

        if !output.status.success() {
            return Err(EngineError::load_failed(format!(
                "ffmpeg -version exited with code: {:?}",
                output.status.code()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let version = parse_version(&stdout).unwrap_or_else(|| "unknown".to_string());

        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| {
                EngineError::load_failed(format!(
                    "Failed to create work directory {}: {}",
                    self.work_dir.display(),
                    e
                ))
            })?;

        info!(version = %version, path = %self.ffmpeg_path.display(), "FFmpeg available");

        Ok(FfmpegEngine {
            path: self.ffmpeg_path.clone(),
            version,
            work_dir: self.work_dir.clone(),
        })
    }
}

/// Extracts the version from `ffmpeg -version` output.
fn parse_version(output: &str) -> Option<String> {
    output
        .lines()
        .next()?
        .strip_prefix("ffmpeg version ")?
        .split_whitespace()
        .next()
        .map(str::to_string)
}

/// Parses the `Duration: HH:MM:SS.xx` line printed for an input.
fn parse_duration(line: &str, re: &Regex) -> Option<f64> {
    let caps = re.captures(line)?;
    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// FFmpeg backend implementation.
pub struct FfmpegBackend {
    config: FfmpegConfig,
    engine: Arc<SharedEngine<FfmpegLoader>>,
    permits: Semaphore,
    registry: FormatRegistry,
}

impl FfmpegBackend {
    /// Creates a backend with the given configuration. Nothing is loaded until
    /// the first conversion.
    pub fn new(config: FfmpegConfig) -> Self {
        let loader = FfmpegLoader::new(config.ffmpeg_path.clone(), config.work_dir.clone());
        let permits = Semaphore::new(config.max_parallel.max(1));
        Self {
            config,
            engine: Arc::new(SharedEngine::new(loader)),
            permits,
            registry: FormatRegistry::new(),
        }
    }

    /// Creates a backend with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FfmpegConfig::default())
    }

    /// The shared engine guard, for status reporting and teardown.
    pub fn engine(&self) -> Arc<SharedEngine<FfmpegLoader>> {
        Arc::clone(&self.engine)
    }

    pub fn engine_status(&self) -> EngineStatus {
        self.engine.status()
    }

    /// Reads the input duration from ffmpeg's stream summary.
    async fn probe_duration(&self, engine: &FfmpegEngine, input_path: &Path) -> Option<f64> {
        let output = Command::new(&engine.path)
            .arg("-hide_banner")
            .arg("-i")
            .arg(input_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .ok()?;

        let re = Regex::new(r"Duration: (\d+):(\d+):(\d+(?:\.\d+)?)").ok()?;
        String::from_utf8_lossy(&output.stderr)
            .lines()
            .find_map(|line| parse_duration(line, &re))
    }

    async fn run(
        &self,
        engine: &FfmpegEngine,
        staging: &Path,
        input: &InputFile,
        request: &BackendRequest,
        progress: &ProgressSink,
    ) -> Result<ConversionOutput, BackendError> {
        let input_path = staging.join(format!("input.{}", request.input_format));
        let output_path = staging.join(format!("output.{}", request.output_format));
        tokio::fs::write(&input_path, &input.data).await?;

        let args = build_args(request, &input_path, &output_path, &self.config).ok_or_else(|| {
            BackendError::rejected(format!(
                "FFmpeg backend cannot convert {} to {}",
                request.input_format, request.output_format
            ))
        })?;

        let probed = self.probe_duration(engine, &input_path).await;
        let duration_secs = effective_duration(probed, request);
        debug!(?duration_secs, "Probed input duration");

        let mut child = Command::new(&engine.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    BackendError::FfmpegNotFound {
                        path: engine.path.clone(),
                    }
                } else {
                    BackendError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BackendError::process_failed("FFmpeg stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();
        let mut error_output = String::new();
        let mut last_percent = 0u8;

        while let Some(line) = reader.next_line().await? {
            if line.contains("Error") || line.contains("error") {
                error_output.push_str(&line);
                error_output.push('\n');
            }

            let Some(ref re) = time_regex else { continue };
            let Some(micros) = re
                .captures(&line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
            else {
                continue;
            };

            if let Some(total) = duration_secs.filter(|d| *d > 0.0) {
                let percent = ((micros / 1_000_000.0) / total * 100.0).clamp(0.0, 100.0) as u8;
                if percent > last_percent {
                    last_percent = percent;
                    progress.report(percent);
                }
            }

            if progress.is_closed() {
                warn!("Progress channel closed, stopping ffmpeg");
                let _ = child.kill().await;
                return Err(BackendError::rejected("Conversion cancelled"));
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            let reason = error_output
                .lines()
                .last()
                .map(str::to_string)
                .unwrap_or_else(|| format!("FFmpeg exited with code: {:?}", status.code()));
            return Err(BackendError::process_failed(
                reason,
                (!error_output.is_empty()).then_some(error_output),
            ));
        }

        let data = tokio::fs::read(&output_path).await.map_err(|_| {
            BackendError::process_failed("Output file not created", None)
        })?;

        let mime_type = self
            .registry
            .lookup(&request.output_format)
            .map(|def| def.primary_mime())
            .unwrap_or("application/octet-stream");

        Ok(ConversionOutput::Single(OutputFile::new(
            output_file_name(&input.name, &request.output_format),
            mime_type,
            data,
        )))
    }
}

/// Duration of the portion being converted, accounting for trims.
fn effective_duration(probed: Option<f64>, request: &BackendRequest) -> Option<f64> {
    let start = request.options.trim_start.unwrap_or(0.0);
    let end = match (probed, request.options.trim_end) {
        (Some(total), Some(end)) => end.min(total),
        (Some(total), None) => total,
        (None, Some(end)) => end,
        (None, None) => return None,
    };
    Some((end - start).max(0.0))
}

#[async_trait]
impl ConversionBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn convert(
        &self,
        input: &InputFile,
        request: &BackendRequest,
        progress: ProgressSink,
    ) -> Result<ConversionOutput, BackendError> {
        let engine = self.engine.get().await?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| BackendError::rejected("FFmpeg backend is shutting down"))?;

        let staging = engine
            .work_dir
            .join(uuid::Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&staging).await?;

        let result = self.run(&engine, &staging, input, request, &progress).await;

        if let Err(e) = tokio::fs::remove_dir_all(&staging).await {
            warn!(path = %staging.display(), "Failed to clean up staging directory: {}", e);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ConversionOptions;
    use crate::router::ConversionRoute;

    fn request(options: ConversionOptions) -> BackendRequest {
        BackendRequest {
            route: ConversionRoute::Audio,
            input_format: "wav".to_string(),
            output_format: "mp3".to_string(),
            options,
        }
    }

    #[test]
    fn test_parse_version() {
        let out = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023 the FFmpeg developers\nbuilt with gcc";
        assert_eq!(parse_version(out).as_deref(), Some("6.1.1-3ubuntu5"));
        assert_eq!(parse_version("something else"), None);
    }

    #[test]
    fn test_parse_duration() {
        let re = Regex::new(r"Duration: (\d+):(\d+):(\d+(?:\.\d+)?)").unwrap();
        let line = "  Duration: 01:02:03.50, start: 0.000000, bitrate: 1411 kb/s";
        assert_eq!(parse_duration(line, &re), Some(3723.5));
        assert_eq!(parse_duration("  Stream #0:0: Audio", &re), None);
    }

    #[test]
    fn test_effective_duration_with_trims() {
        assert_eq!(effective_duration(Some(60.0), &request(Default::default())), Some(60.0));

        let trimmed = request(ConversionOptions {
            trim_start: Some(10.0),
            trim_end: Some(25.0),
            ..Default::default()
        });
        assert_eq!(effective_duration(Some(60.0), &trimmed), Some(15.0));

        let past_end = request(ConversionOptions {
            trim_start: Some(10.0),
            trim_end: Some(90.0),
            ..Default::default()
        });
        assert_eq!(effective_duration(Some(60.0), &past_end), Some(50.0));

        assert_eq!(effective_duration(None, &request(Default::default())), None);
    }

    #[tokio::test]
    async fn test_missing_binary_fails_engine_load() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FfmpegBackend::new(
            FfmpegConfig::default()
                .with_ffmpeg_path("/nonexistent/ffmpeg-binary")
                .with_work_dir(dir.path().join("work")),
        );

        let input = InputFile::new("a.wav", vec![0u8; 16]);
        let err = backend
            .convert(&input, &request(Default::default()), ProgressSink::noop())
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Engine(_)));
        assert!(err.to_string().contains("FFmpeg not found"));
        assert_eq!(backend.engine_status(), EngineStatus::Uninitialized);
    }
}
