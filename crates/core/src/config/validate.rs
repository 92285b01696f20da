use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Size limits are non-zero and ordered
/// - Retention window and sweep interval are non-zero
/// - Progress bands satisfy `0 < staging < work_end < 100`
/// - FFmpeg parallelism and history buffer are non-zero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    fn invalid(message: &str) -> Result<(), ConfigError> {
        Err(ConfigError::ValidationError(message.to_string()))
    }

    // Server validation
    if config.server.port == 0 {
        return invalid("server.port cannot be 0");
    }

    // Limits validation
    if config.limits.max_file_size_bytes == 0 {
        return invalid("limits.max_file_size_bytes cannot be 0");
    }
    if config.limits.warn_file_size_bytes > config.limits.max_file_size_bytes {
        return invalid("limits.warn_file_size_bytes cannot exceed limits.max_file_size_bytes");
    }
    if config.limits.max_batch_files == 0 {
        return invalid("limits.max_batch_files cannot be 0");
    }

    // Retention validation
    if config.retention.window_minutes == 0 {
        return invalid("retention.window_minutes cannot be 0");
    }
    if config.retention.sweep_interval_secs == 0 {
        return invalid("retention.sweep_interval_secs cannot be 0");
    }

    // Progress validation
    let progress = &config.progress;
    if !(0 < progress.staging_percent
        && progress.staging_percent < progress.work_end_percent
        && progress.work_end_percent < 100)
    {
        return invalid(
            "progress bands must satisfy 0 < staging_percent < work_end_percent < 100",
        );
    }
    if progress.channel_capacity == 0 {
        return invalid("progress.channel_capacity cannot be 0");
    }

    if config.ffmpeg.max_parallel == 0 {
        return invalid("ffmpeg.max_parallel cannot be 0");
    }
    if config.history.buffer_size == 0 {
        return invalid("history.buffer_size cannot be 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invalid(config: &Config, needle: &str) {
        match validate_config(config) {
            Err(ConfigError::ValidationError(message)) => {
                assert!(message.contains(needle), "unexpected message: {}", message)
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        assert_invalid(&config, "server.port");
    }

    #[test]
    fn test_validate_limits() {
        let mut config = Config::default();
        config.limits.warn_file_size_bytes = config.limits.max_file_size_bytes + 1;
        assert_invalid(&config, "warn_file_size_bytes");

        let mut config = Config::default();
        config.limits.max_file_size_bytes = 0;
        assert_invalid(&config, "max_file_size_bytes");

        let mut config = Config::default();
        config.limits.max_batch_files = 0;
        assert_invalid(&config, "max_batch_files");
    }

    #[test]
    fn test_validate_retention() {
        let mut config = Config::default();
        config.retention.window_minutes = 0;
        assert_invalid(&config, "window_minutes");

        let mut config = Config::default();
        config.retention.sweep_interval_secs = 0;
        assert_invalid(&config, "sweep_interval_secs");
    }

    #[test]
    fn test_validate_progress_bands() {
        for (staging, work_end) in [(0, 95), (50, 50), (60, 40), (10, 100)] {
            let mut config = Config::default();
            config.progress.staging_percent = staging;
            config.progress.work_end_percent = work_end;
            assert_invalid(&config, "progress bands");
        }
    }

    #[test]
    fn test_validate_parallelism_and_history() {
        let mut config = Config::default();
        config.ffmpeg.max_parallel = 0;
        assert_invalid(&config, "ffmpeg.max_parallel");

        let mut config = Config::default();
        config.history.buffer_size = 0;
        assert_invalid(&config, "history.buffer_size");
    }
}
