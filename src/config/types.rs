use std::path::PathBuf;
use std::time::Duration;

use clipgif_av::ToolsConfig;
use clipgif_common::ComplianceLimits;
use serde::{Deserialize, Serialize};

use crate::conversion::{FrameCountBackend, QualityTable};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub limits: ComplianceLimits,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub invoke: InvokeConfig,

    #[serde(default)]
    pub check: CheckConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory for derived output names. Defaults to the source's
    /// directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Form defaults used when a parameter is not given on the command line.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub start_time: f64,

    #[serde(default = "default_duration")]
    pub duration: f64,

    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,

    #[serde(default = "default_quality")]
    pub quality: i64,

    #[serde(default = "default_width")]
    pub width: i64,

    #[serde(default = "default_dither")]
    pub dither: String,

    #[serde(default = "default_colors")]
    pub colors: i64,
}

fn default_duration() -> f64 {
    5.0
}

fn default_frame_rate() -> f64 {
    25.0
}

fn default_quality() -> i64 {
    3
}

fn default_width() -> i64 {
    800
}

fn default_dither() -> String {
    "bayer".to_string()
}

fn default_colors() -> i64 {
    256
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            duration: default_duration(),
            frame_rate: default_frame_rate(),
            quality: default_quality(),
            width: default_width(),
            dither: default_dither(),
            colors: default_colors(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct QualityConfig {
    /// `bayer_scale` per quality level, lowest level first.
    #[serde(default)]
    pub bayer_scale: QualityTable,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct InvokeConfig {
    /// Kill ffmpeg after this many seconds across both passes.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Where conversion workspaces are created. Defaults to the system temp
    /// directory.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl InvokeConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CheckConfig {
    #[serde(default)]
    pub frame_counter: FrameCountBackend,
}
