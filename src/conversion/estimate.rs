//! Pre-conversion output estimate.
//!
//! The size model is empirical: `frames * W * H * (colours / 256) * level`
//! divided by a fixed compression factor. It is only meant to warn early;
//! the compliance check after conversion is authoritative.

use clipgif_common::ComplianceLimits;
use serde::Serialize;

use super::compliance::human_bytes;
use super::request::ConversionJob;

const COMPRESSION_FACTOR: f64 = 30_000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimate {
    /// Nominal frame count, `floor(fps * duration)`.
    pub frames: u64,
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
    pub warnings: Vec<String>,
}

impl Estimate {
    pub fn exceeds_frames(&self, limits: &ComplianceLimits) -> bool {
        self.frames > limits.max_frames
    }

    pub fn exceeds_bytes(&self, limits: &ComplianceLimits) -> bool {
        self.bytes > limits.max_bytes
    }
}

/// Estimate the output of `job` and list the limits it would exceed.
pub fn estimate(job: &ConversionJob, limits: &ComplianceLimits) -> Estimate {
    let frames = (f64::from(job.frame_rate()) * job.duration().as_secs_f64()).floor() as u64;
    let width = job.output_width();
    let height = output_height(width, job.source_dimensions());

    let colour_factor = f64::from(job.palette_size()) / 256.0;
    let bytes = (frames as f64
        * f64::from(width)
        * f64::from(height)
        * colour_factor
        * f64::from(job.quality())
        / COMPRESSION_FACTOR) as u64;

    let mut estimate = Estimate {
        frames,
        width,
        height,
        bytes,
        warnings: Vec::new(),
    };
    if estimate.exceeds_frames(limits) {
        estimate.warnings.push(format!(
            "{} frames exceeds the {}-frame limit",
            frames, limits.max_frames
        ));
    }
    if estimate.exceeds_bytes(limits) {
        estimate.warnings.push(format!(
            "estimated size {} exceeds the {} limit",
            human_bytes(bytes),
            human_bytes(limits.max_bytes)
        ));
    }
    estimate
}

/// Height preserving the source aspect ratio, or 16:9 when unknown.
fn output_height(width: u32, source: Option<(u32, u32)>) -> u32 {
    match source {
        Some((src_w, src_h)) if src_w > 0 => {
            let height = u64::from(src_h) * u64::from(width) / u64::from(src_w);
            u32::try_from(height).unwrap_or(u32::MAX)
        }
        _ => (u64::from(width) * 9 / 16) as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::{RawParameters, RequestBuilder, SourceInfo};

    fn job(raw: RawParameters, source: SourceInfo) -> ConversionJob {
        RequestBuilder::default().build(&raw, &source).unwrap()
    }

    fn raw(dir: &std::path::Path) -> RawParameters {
        let src = dir.join("clip.mp4");
        std::fs::write(&src, b"x").unwrap();
        RawParameters::new(src)
    }

    #[test]
    fn defaults_estimate() {
        let dir = tempfile::tempdir().unwrap();
        let est = estimate(
            &job(raw(dir.path()), SourceInfo::default()),
            &ComplianceLimits::WECHAT,
        );
        // 25 fps * 5 s, 800x450 at 256 colours, level 3.
        assert_eq!(est.frames, 125);
        assert_eq!((est.width, est.height), (800, 450));
        assert_eq!(est.bytes, 4_500);
        assert!(est.warnings.is_empty());
    }

    #[test]
    fn uses_source_aspect_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let source = SourceInfo {
            length: None,
            dimensions: Some((1080, 1920)),
        };
        let est = estimate(&job(raw(dir.path()), source), &ComplianceLimits::WECHAT);
        assert_eq!(est.height, 1422);
    }

    #[test]
    fn warns_about_frames() {
        let dir = tempfile::tempdir().unwrap();
        let r = RawParameters {
            duration: 12.5,
            ..raw(dir.path())
        };
        let est = estimate(&job(r, SourceInfo::default()), &ComplianceLimits::WECHAT);
        assert_eq!(est.frames, 312);
        assert!(est.exceeds_frames(&ComplianceLimits::WECHAT));
        assert!(est.warnings.iter().any(|w| w.contains("312 frames")));
    }

    #[test]
    fn frames_round_down() {
        let dir = tempfile::tempdir().unwrap();
        let r = RawParameters {
            duration: 0.99,
            frame_rate: 10.0,
            ..raw(dir.path())
        };
        let est = estimate(&job(r, SourceInfo::default()), &ComplianceLimits::WECHAT);
        assert_eq!(est.frames, 9);
    }

    #[test]
    fn widest_job_does_not_overflow() {
        let dir = tempfile::tempdir().unwrap();
        let r = RawParameters {
            output_width: 1_000_000_000,
            ..raw(dir.path())
        };
        let est = estimate(&job(r, SourceInfo::default()), &ComplianceLimits::WECHAT);
        assert_eq!((est.width, est.height), (65_534, 36_862));
        assert!(est.exceeds_bytes(&ComplianceLimits::WECHAT));

        let tall = SourceInfo {
            length: None,
            dimensions: Some((1, u32::MAX)),
        };
        let r = RawParameters {
            output_width: 65_534,
            ..raw(dir.path())
        };
        let est = estimate(&job(r, tall), &ComplianceLimits::WECHAT);
        assert_eq!(est.height, u32::MAX);
    }
}
