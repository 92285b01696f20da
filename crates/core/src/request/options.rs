//! Conversion options.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::validate::ValidationError;

/// Open configuration bag for a conversion.
///
/// Every field is optional. Backends read the fields that apply to their
/// format family and fall back to their own defaults for the rest. Unknown
/// keys are kept in `extra` so backends can accept options this struct does
/// not model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    // Image
    /// Output quality, 1-100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintain_aspect_ratio: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop: Option<CropRect>,
    /// Clockwise rotation in degrees (0, 90, 180 or 270).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_horizontal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip_vertical: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_exif: Option<bool>,

    // Document
    /// Page selection such as `1-3,5`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    // Audio
    /// Audio bitrate in kbps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u32>,
    /// Sample rate in Hz.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channels: Option<AudioChannels>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize: Option<bool>,

    // Video
    /// Video bitrate in kbps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_bitrate: Option<u32>,
    /// Audio bitrate for the audio track of a video, in kbps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_bitrate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framerate: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_audio: Option<bool>,
    /// Trim start in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_start: Option<f64>,
    /// Trim end in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,

    // Archive
    /// Compression level, 1-9.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_level: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_password: Option<String>,

    /// Options not modelled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioChannels {
    Mono,
    Stereo,
}

impl AudioChannels {
    pub fn count(&self) -> u8 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Output resolution presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "4k")]
    K4,
}

impl Resolution {
    /// Frame size as `(width, height)`.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Self::P360 => (640, 360),
            Self::P480 => (854, 480),
            Self::P720 => (1280, 720),
            Self::P1080 => (1920, 1080),
            Self::K4 => (3840, 2160),
        }
    }
}

impl ConversionOptions {
    /// Checks value ranges. Fields that are absent are always valid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(q) = self.quality {
            if !(1..=100).contains(&q) {
                return Err(ValidationError::invalid_option(
                    "quality",
                    "must be between 1 and 100",
                ));
            }
        }

        if let Some(level) = self.compression_level {
            if !(1..=9).contains(&level) {
                return Err(ValidationError::invalid_option(
                    "compression_level",
                    "must be between 1 and 9",
                ));
            }
        }

        if self.width == Some(0) {
            return Err(ValidationError::invalid_option("width", "must be positive"));
        }
        if self.height == Some(0) {
            return Err(ValidationError::invalid_option("height", "must be positive"));
        }

        if let Some(crop) = self.crop {
            if crop.width == 0 || crop.height == 0 {
                return Err(ValidationError::invalid_option(
                    "crop",
                    "width and height must be positive",
                ));
            }
        }

        if let Some(rotate) = self.rotate {
            if !matches!(rotate, 0 | 90 | 180 | 270) {
                return Err(ValidationError::invalid_option(
                    "rotate",
                    "must be 0, 90, 180 or 270",
                ));
            }
        }

        if self.sample_rate == Some(0) {
            return Err(ValidationError::invalid_option(
                "sample_rate",
                "must be positive",
            ));
        }

        if let Some(start) = self.trim_start {
            if !start.is_finite() || start < 0.0 {
                return Err(ValidationError::invalid_option(
                    "trim_start",
                    "must be a non-negative number of seconds",
                ));
            }
        }

        if let Some(end) = self.trim_end {
            let start = self.trim_start.unwrap_or(0.0);
            if !end.is_finite() || end <= start {
                return Err(ValidationError::invalid_option(
                    "trim_end",
                    "must be after trim_start",
                ));
            }
        }

        Ok(())
    }
}
