//! Checks a produced GIF against platform limits.

use std::path::{Path, PathBuf};

use clipgif_av::{
    CompositeFrameCounter, FfprobeFrameCounter, FrameCounter, GifFrameCounter, ToolRegistry,
    FFPROBE,
};
use clipgif_common::{ComplianceLimits, Error, Result};
use serde::{Deserialize, Serialize};

/// Which backend counts frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameCountBackend {
    /// Native GIF decoding, then ffprobe if it is available.
    #[default]
    Auto,
    Native,
    Ffprobe,
}

/// Overage per violated limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceededBy {
    pub bytes: Option<u64>,
    pub frames: Option<u64>,
}

/// Outcome of a compliance check. Advisory only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    pub output_path: PathBuf,
    pub file_size_bytes: u64,
    pub frame_count: u64,
    pub within_limits: bool,
    pub exceeded_by: ExceededBy,
    pub limits: ComplianceLimits,
}

impl ConversionReport {
    /// Compare measured values against `limits`.
    pub fn evaluate(
        output_path: impl Into<PathBuf>,
        file_size_bytes: u64,
        frame_count: u64,
        limits: ComplianceLimits,
    ) -> Self {
        let exceeded_by = ExceededBy {
            bytes: file_size_bytes
                .checked_sub(limits.max_bytes)
                .filter(|&over| over > 0),
            frames: frame_count
                .checked_sub(limits.max_frames)
                .filter(|&over| over > 0),
        };
        Self {
            output_path: output_path.into(),
            file_size_bytes,
            frame_count,
            within_limits: file_size_bytes <= limits.max_bytes && frame_count <= limits.max_frames,
            exceeded_by,
            limits,
        }
    }

    /// Suggestions for bringing the output within limits, one per violation.
    pub fn advice(&self) -> Vec<String> {
        let mut advice = Vec::new();
        if let Some(over) = self.exceeded_by.bytes {
            advice.push(format!(
                "file is {} over the {} limit; reduce the width or palette size, lower the quality, or shorten the clip",
                human_bytes(over),
                human_bytes(self.limits.max_bytes)
            ));
        }
        if let Some(over) = self.exceeded_by.frames {
            advice.push(format!(
                "{} frames over the {}-frame limit; lower the frame rate or shorten the clip",
                over, self.limits.max_frames
            ));
        }
        advice
    }
}

/// Measures output files and reports them against a set of limits.
pub struct ComplianceChecker {
    limits: ComplianceLimits,
    counter: Box<dyn FrameCounter>,
}

impl ComplianceChecker {
    pub fn new(limits: ComplianceLimits, counter: Box<dyn FrameCounter>) -> Self {
        Self { limits, counter }
    }

    /// Build a checker whose frame counter follows `backend`.
    ///
    /// # Errors
    ///
    /// [`Error::ToolNotFound`] if `backend` is `Ffprobe` and ffprobe is
    /// missing.
    pub fn with_backend(
        limits: ComplianceLimits,
        backend: FrameCountBackend,
        tools: &ToolRegistry,
    ) -> Result<Self> {
        let counter: Box<dyn FrameCounter> = match backend {
            FrameCountBackend::Native => Box::new(GifFrameCounter),
            FrameCountBackend::Ffprobe => {
                Box::new(FfprobeFrameCounter::new(tools.require(FFPROBE)?.path.clone()))
            }
            FrameCountBackend::Auto => {
                let mut counters: Vec<Box<dyn FrameCounter>> = vec![Box::new(GifFrameCounter)];
                if let Some(ffprobe) = tools.get(FFPROBE) {
                    counters.push(Box::new(FfprobeFrameCounter::new(ffprobe.path.clone())));
                }
                Box::new(CompositeFrameCounter::new(counters))
            }
        };
        Ok(Self::new(limits, counter))
    }

    pub fn limits(&self) -> &ComplianceLimits {
        &self.limits
    }

    /// Measure `path` exactly. The file is only read.
    pub async fn check(&self, path: &Path) -> Result<ConversionReport> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| Error::resource(path, format!("cannot read output: {e}")))?;
        if !metadata.is_file() {
            return Err(Error::resource(path, "not a file"));
        }

        let frames = self.counter.count_frames(path).await?;
        let report = ConversionReport::evaluate(path, metadata.len(), frames, self.limits);

        if report.within_limits {
            tracing::info!(
                "{} is within limits ({} bytes, {} frames)",
                path.display(),
                report.file_size_bytes,
                report.frame_count
            );
        } else {
            tracing::warn!(
                "{} exceeds limits: {:?}",
                path.display(),
                report.exceeded_by
            );
        }
        Ok(report)
    }
}

/// Format a byte count as `12.34 MB` (binary units).
pub fn human_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KIB * KIB {
        format!("{:.2} MB", b / (KIB * KIB))
    } else if b >= KIB {
        format!("{:.1} KB", b / KIB)
    } else {
        format!("{bytes} B")
    }
}
