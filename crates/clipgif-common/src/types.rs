//! Core type definitions shared by the builder, invoker and checker.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Conversion parameter named in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    SourcePath,
    StartTime,
    Duration,
    FrameRate,
    Quality,
    OutputWidth,
    DitherMode,
    PaletteSize,
    OutputPath,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SourcePath => "source path",
            Self::StartTime => "start time",
            Self::Duration => "duration",
            Self::FrameRate => "frame rate",
            Self::Quality => "quality",
            Self::OutputWidth => "output width",
            Self::DitherMode => "dither mode",
            Self::PaletteSize => "palette size",
            Self::OutputPath => "output path",
        };
        f.write_str(name)
    }
}

/// Dithering algorithm applied by ffmpeg's `paletteuse` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherMode {
    /// No dithering; flat colour bands.
    None,
    /// Ordered 8x8 Bayer dithering. Strength follows the quality level.
    #[default]
    Bayer,
    /// Heckbert's simple error diffusion.
    Heckbert,
    /// Floyd-Steinberg error diffusion.
    FloydSteinberg,
    /// Frankie Sierra dithering v2.
    Sierra2,
    /// Frankie Sierra "lite" dithering (2-4a).
    #[serde(rename = "sierra2_4a")]
    Sierra2_4a,
}

impl DitherMode {
    /// All supported modes, in presentation order.
    pub const ALL: [DitherMode; 6] = [
        DitherMode::Bayer,
        DitherMode::FloydSteinberg,
        DitherMode::Sierra2_4a,
        DitherMode::Sierra2,
        DitherMode::Heckbert,
        DitherMode::None,
    ];

    /// Value accepted by `paletteuse=dither=`.
    pub fn as_ffmpeg(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bayer => "bayer",
            Self::Heckbert => "heckbert",
            Self::FloydSteinberg => "floyd_steinberg",
            Self::Sierra2 => "sierra2",
            Self::Sierra2_4a => "sierra2_4a",
        }
    }
}

impl fmt::Display for DitherMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ffmpeg())
    }
}

impl FromStr for DitherMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        DitherMode::ALL
            .into_iter()
            .find(|mode| mode.as_ffmpeg() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = DitherMode::ALL.iter().map(|m| m.as_ffmpeg()).collect();
                format!("unknown dither mode '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Hard limits imposed by the publishing platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceLimits {
    /// Maximum output size in bytes.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Maximum number of frames.
    #[serde(default = "default_max_frames")]
    pub max_frames: u64,
}

fn default_max_bytes() -> u64 {
    ComplianceLimits::WECHAT.max_bytes
}

fn default_max_frames() -> u64 {
    ComplianceLimits::WECHAT.max_frames
}

impl ComplianceLimits {
    /// WeChat official-account limits: 10 MiB and 300 frames.
    pub const WECHAT: ComplianceLimits = ComplianceLimits {
        max_bytes: 10 * 1024 * 1024,
        max_frames: 300,
    };

    /// Create limits with explicit values.
    pub fn new(max_bytes: u64, max_frames: u64) -> Self {
        Self {
            max_bytes,
            max_frames,
        }
    }
}

impl Default for ComplianceLimits {
    fn default() -> Self {
        Self::WECHAT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dither_mode_parses_known_names() {
        assert_eq!("bayer".parse::<DitherMode>(), Ok(DitherMode::Bayer));
        assert_eq!(
            "Floyd-Steinberg".parse::<DitherMode>(),
            Ok(DitherMode::FloydSteinberg)
        );
        assert_eq!("sierra2_4a".parse::<DitherMode>(), Ok(DitherMode::Sierra2_4a));
        assert_eq!("none".parse::<DitherMode>(), Ok(DitherMode::None));
    }

    #[test]
    fn dither_mode_rejects_unknown() {
        let err = "ordered".parse::<DitherMode>().unwrap_err();
        assert!(err.contains("ordered"));
        assert!(err.contains("bayer"));
    }

    #[test]
    fn dither_mode_serde_matches_ffmpeg_names() {
        for mode in DitherMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_ffmpeg()));
        }
    }

    #[test]
    fn default_limits_are_wechat() {
        let limits = ComplianceLimits::default();
        assert_eq!(limits.max_bytes, 10_485_760);
        assert_eq!(limits.max_frames, 300);
    }

    #[test]
    fn limits_deserialize_with_defaults() {
        let limits: ComplianceLimits = serde_json::from_str(r#"{"max_frames": 120}"#).unwrap();
        assert_eq!(limits.max_frames, 120);
        assert_eq!(limits.max_bytes, ComplianceLimits::WECHAT.max_bytes);
    }

    #[test]
    fn field_display() {
        assert_eq!(Field::PaletteSize.to_string(), "palette size");
        assert_eq!(Field::SourcePath.to_string(), "source path");
    }
}
