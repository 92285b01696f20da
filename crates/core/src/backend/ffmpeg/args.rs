//! FFmpeg argument construction.

use std::path::Path;

use super::config::FfmpegConfig;
use crate::backend::BackendRequest;
use crate::request::ConversionOptions;
use crate::router::ConversionRoute;

/// Audio codec for an output extension.
pub(crate) fn audio_codec(extension: &str) -> Option<&'static str> {
    match extension {
        "mp3" => Some("libmp3lame"),
        "ogg" => Some("libvorbis"),
        "aac" | "m4a" => Some("aac"),
        "flac" => Some("flac"),
        "opus" => Some("libopus"),
        "wav" => Some("pcm_s16le"),
        _ => None,
    }
}

/// Default audio bitrate in kbps. Lossless formats have none.
pub(crate) fn default_audio_bitrate(extension: &str) -> Option<u32> {
    match extension {
        "mp3" | "aac" | "m4a" | "ogg" => Some(192),
        "opus" => Some(128),
        _ => None,
    }
}

/// Default video and audio codecs for a container.
fn video_codecs(container: &str) -> (&'static str, &'static str) {
    match container {
        "webm" => ("libvpx-vp9", "libopus"),
        "avi" => ("mpeg4", "libmp3lame"),
        _ => ("libx264", "aac"),
    }
}

fn push<I, S>(args: &mut Vec<String>, items: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    args.extend(items.into_iter().map(Into::into));
}

fn trim_args(args: &mut Vec<String>, options: &ConversionOptions) {
    if let Some(start) = options.trim_start {
        push(args, ["-ss".to_string(), start.to_string()]);
    }
    if let Some(end) = options.trim_end {
        push(args, ["-to".to_string(), end.to_string()]);
    }
}

fn audio_args(args: &mut Vec<String>, output: &str, options: &ConversionOptions, from_video: bool) {
    if from_video {
        push(args, ["-vn"]);
    }

    if let Some(codec) = audio_codec(output) {
        push(args, ["-c:a", codec]);
    }

    match options.bitrate.or_else(|| if from_video { None } else { default_audio_bitrate(output) }) {
        Some(bitrate) if default_audio_bitrate(output).is_some() => {
            push(args, ["-b:a".to_string(), format!("{}k", bitrate)]);
        }
        // VBR for mp3 extracted from video
        None if from_video && output == "mp3" => push(args, ["-q:a", "2"]),
        _ => {}
    }

    if let Some(rate) = options.sample_rate {
        push(args, ["-ar".to_string(), rate.to_string()]);
    }
    if let Some(channels) = options.channels {
        push(args, ["-ac".to_string(), channels.count().to_string()]);
    }
    if options.normalize == Some(true) {
        push(args, ["-af", "loudnorm"]);
    }
}

fn scale_filter(options: &ConversionOptions) -> Option<String> {
    if let Some(resolution) = options.resolution {
        let (w, h) = resolution.dimensions();
        return Some(format!("scale={}:{}", w, h));
    }
    match (options.width, options.height) {
        (Some(w), Some(h)) if options.maintain_aspect_ratio == Some(true) => Some(format!(
            "scale={}:{}:force_original_aspect_ratio=decrease",
            w, h
        )),
        (Some(w), Some(h)) => Some(format!("scale={}:{}", w, h)),
        (Some(w), None) => Some(format!("scale={}:-2", w)),
        (None, Some(h)) => Some(format!("scale=-2:{}", h)),
        (None, None) => None,
    }
}

fn video_args(args: &mut Vec<String>, output: &str, options: &ConversionOptions) {
    let (default_video, default_audio) = video_codecs(output);
    let video_codec = options.video_codec.as_deref().unwrap_or(default_video);
    push(args, ["-c:v", video_codec]);

    if let Some(bitrate) = options.video_bitrate {
        push(args, ["-b:v".to_string(), format!("{}k", bitrate)]);
    }
    if let Some(fps) = options.framerate {
        push(args, ["-r".to_string(), fps.to_string()]);
    }
    if let Some(filter) = scale_filter(options) {
        push(args, ["-vf".to_string(), filter]);
    }

    if options.remove_audio == Some(true) {
        push(args, ["-an"]);
    } else {
        push(args, ["-c:a", default_audio]);
        if let Some(bitrate) = options.audio_bitrate {
            push(args, ["-b:a".to_string(), format!("{}k", bitrate)]);
        }
    }

    if matches!(output, "mp4" | "mov") {
        push(args, ["-movflags", "+faststart"]);
    }
}

fn gif_args(args: &mut Vec<String>, options: &ConversionOptions) {
    let fps = options.framerate.unwrap_or(10);
    let width = options
        .resolution
        .map(|r| r.dimensions().0)
        .or(options.width)
        .unwrap_or(480);
    push(
        args,
        [
            "-vf".to_string(),
            format!(
                "fps={},scale={}:-1:flags=lanczos,split[s0][s1];[s0]palettegen[p];[s1][p]paletteuse",
                fps, width
            ),
            "-loop".to_string(),
            "0".to_string(),
        ],
    );
}

/// Builds the ffmpeg command line for `request`.
///
/// Returns `None` for routes this backend does not handle.
pub(crate) fn build_args(
    request: &BackendRequest,
    input_path: &Path,
    output_path: &Path,
    config: &FfmpegConfig,
) -> Option<Vec<String>> {
    let options = &request.options;
    let output = request.output_format.as_str();

    let mut args = vec![
        "-hide_banner".to_string(),
        "-y".to_string(), // Overwrite output
        "-i".to_string(),
        input_path.to_string_lossy().to_string(),
    ];

    trim_args(&mut args, options);

    match request.route {
        ConversionRoute::Audio => audio_args(&mut args, output, options, false),
        ConversionRoute::VideoToAudio => audio_args(&mut args, output, options, true),
        ConversionRoute::VideoTranscode => video_args(&mut args, output, options),
        ConversionRoute::VideoToGif => gif_args(&mut args, options),
        _ => return None,
    }

    // Log level and progress
    push(
        &mut args,
        [
            "-loglevel".to_string(),
            config.log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ],
    );

    args.extend(config.extra_args.iter().cloned());
    args.push(output_path.to_string_lossy().to_string());

    Some(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{AudioChannels, Resolution};
    use std::path::PathBuf;

    fn request(route: ConversionRoute, input: &str, output: &str, options: ConversionOptions) -> BackendRequest {
        BackendRequest {
            route,
            input_format: input.to_string(),
            output_format: output.to_string(),
            options,
        }
    }

    fn build(req: &BackendRequest) -> Vec<String> {
        build_args(
            req,
            &PathBuf::from("/tmp/in"),
            &PathBuf::from("/tmp/out"),
            &FfmpegConfig::default(),
        )
        .unwrap()
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn test_audio_defaults() {
        let args = build(&request(ConversionRoute::Audio, "wav", "mp3", Default::default()));
        assert!(has_pair(&args, "-c:a", "libmp3lame"));
        assert!(has_pair(&args, "-b:a", "192k"));
        assert!(has_pair(&args, "-progress", "pipe:2"));
        assert_eq!(args.last().unwrap(), "/tmp/out");
    }

    #[test]
    fn test_lossless_audio_has_no_bitrate() {
        let options = ConversionOptions {
            bitrate: Some(320),
            sample_rate: Some(48000),
            channels: Some(AudioChannels::Mono),
            ..Default::default()
        };
        let args = build(&request(ConversionRoute::Audio, "mp3", "flac", options));
        assert!(has_pair(&args, "-c:a", "flac"));
        assert!(!args.contains(&"-b:a".to_string()));
        assert!(has_pair(&args, "-ar", "48000"));
        assert!(has_pair(&args, "-ac", "1"));
    }

    #[test]
    fn test_opus_default_bitrate() {
        let args = build(&request(ConversionRoute::Audio, "mp3", "opus", Default::default()));
        assert!(has_pair(&args, "-b:a", "128k"));
    }

    #[test]
    fn test_video_to_mp3_uses_vbr() {
        let args = build(&request(ConversionRoute::VideoToAudio, "mp4", "mp3", Default::default()));
        assert!(args.contains(&"-vn".to_string()));
        assert!(has_pair(&args, "-q:a", "2"));
    }

    #[test]
    fn test_video_transcode_options() {
        let options = ConversionOptions {
            resolution: Some(Resolution::P720),
            framerate: Some(30),
            remove_audio: Some(true),
            trim_start: Some(1.0),
            trim_end: Some(5.5),
            ..Default::default()
        };
        let args = build(&request(ConversionRoute::VideoTranscode, "mov", "webm", options));
        assert!(has_pair(&args, "-c:v", "libvpx-vp9"));
        assert!(has_pair(&args, "-vf", "scale=1280:720"));
        assert!(has_pair(&args, "-r", "30"));
        assert!(has_pair(&args, "-ss", "1"));
        assert!(has_pair(&args, "-to", "5.5"));
        assert!(args.contains(&"-an".to_string()));
    }

    #[test]
    fn test_gif_palette() {
        let args = build(&request(ConversionRoute::VideoToGif, "mp4", "gif", Default::default()));
        let filter = args
            .iter()
            .find(|a| a.starts_with("fps="))
            .unwrap();
        assert!(filter.starts_with("fps=10,scale=480:-1:flags=lanczos"));
        assert!(filter.contains("palettegen"));
        assert!(has_pair(&args, "-loop", "0"));
    }

    #[test]
    fn test_unhandled_route() {
        let req = request(ConversionRoute::RasterImage, "png", "jpg", Default::default());
        let args = build_args(
            &req,
            &PathBuf::from("/tmp/in"),
            &PathBuf::from("/tmp/out"),
            &FfmpegConfig::default(),
        );
        assert!(args.is_none());
    }
}
