//! Media probing and exact frame counting.
//!
//! Frame counting sits behind the [`FrameCounter`] trait so the compliance
//! checker can use native GIF decoding, ffprobe, or a
//! [`CompositeFrameCounter`] trying several backends in order.

mod ffprobe;
mod native;
mod types;

pub use self::ffprobe::{count_frames_with_ffprobe, parse_frame_rate, probe_with_ffprobe};
pub use self::native::count_gif_frames;
pub use self::types::{MediaInfo, VideoStream};

use async_trait::async_trait;
use clipgif_common::paths::is_gif_file;
use clipgif_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Backend able to count the frames of a media file exactly.
#[async_trait]
pub trait FrameCounter: Send + Sync {
    /// Human-readable name of this backend.
    fn name(&self) -> &'static str;

    /// Whether this backend can handle `path`. `true` does not guarantee
    /// that counting succeeds.
    fn supports(&self, path: &Path) -> bool;

    /// Count the frames of `path`.
    async fn count_frames(&self, path: &Path) -> Result<u64>;
}

/// Counts frames by decoding the GIF natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct GifFrameCounter;

#[async_trait]
impl FrameCounter for GifFrameCounter {
    fn name(&self) -> &'static str {
        "gif"
    }

    fn supports(&self, path: &Path) -> bool {
        is_gif_file(path)
    }

    async fn count_frames(&self, path: &Path) -> Result<u64> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || count_gif_frames(&path))
            .await
            .map_err(|e| Error::parse("gif", format!("frame counting task failed: {e}")))?
    }
}

/// Counts frames with `ffprobe -count_frames`.
#[derive(Debug, Clone)]
pub struct FfprobeFrameCounter {
    ffprobe: PathBuf,
}

impl FfprobeFrameCounter {
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }
}

#[async_trait]
impl FrameCounter for FfprobeFrameCounter {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    fn supports(&self, _path: &Path) -> bool {
        true
    }

    async fn count_frames(&self, path: &Path) -> Result<u64> {
        count_frames_with_ffprobe(&self.ffprobe, path).await
    }
}

/// Tries each registered [`FrameCounter`] in order and returns the first
/// successful count.
pub struct CompositeFrameCounter {
    counters: Vec<Box<dyn FrameCounter>>,
}

impl CompositeFrameCounter {
    /// Create a composite from an ordered list of counters.
    pub fn new(counters: Vec<Box<dyn FrameCounter>>) -> Self {
        Self { counters }
    }
}

#[async_trait]
impl FrameCounter for CompositeFrameCounter {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn supports(&self, path: &Path) -> bool {
        self.counters.iter().any(|c| c.supports(path))
    }

    async fn count_frames(&self, path: &Path) -> Result<u64> {
        let mut last_err = None;

        for counter in &self.counters {
            if !counter.supports(path) {
                continue;
            }

            match counter.count_frames(path).await {
                Ok(frames) => return Ok(frames),
                Err(e) => {
                    tracing::debug!(
                        counter = counter.name(),
                        error = %e,
                        "frame counter failed, trying next"
                    );
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            Error::parse(
                "frame counter",
                format!("no frame counter supports {}", path.display()),
            )
        }))
    }
}
