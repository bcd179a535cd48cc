//! Media information types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Metadata of a probed media file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub file_path: PathBuf,
    pub file_size: u64,
    /// Container format name as reported by ffprobe (e.g. "mov,mp4,m4a").
    pub container: String,
    pub duration: Option<Duration>,
    /// First video stream, if any.
    pub video: Option<VideoStream>,
}

impl MediaInfo {
    /// Width and height of the first video stream, when both are known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.video
            .as_ref()
            .filter(|v| v.width > 0 && v.height > 0)
            .map(|v| (v.width, v.height))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoStream {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate: Option<f64>,
    /// Frame count from stream metadata. Not exact for all containers.
    pub frame_count: Option<u64>,
}
