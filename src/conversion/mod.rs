//! Video-to-GIF conversion.
//!
//! A conversion runs in three steps:
//!
//! - [`RequestBuilder`] validates raw parameters into a [`ConversionJob`]
//! - [`TranscodeInvoker`] runs the two-pass palette encode and streams the
//!   ffmpeg log
//! - [`ComplianceChecker`] measures the result against [`ComplianceLimits`]
//!
//! [`estimate()`] predicts frame count and size before anything runs.
//!
//! # Two-pass palette encoding
//!
//! Pass 1 runs `palettegen` over the selected range to compute the best
//! palette of at most `palette_size` colours. Pass 2 re-decodes the range
//! and maps it onto that palette with `paletteuse`, using the requested
//! dither mode and the quality level's `bayer_scale`.
//!
//! [`ComplianceLimits`]: clipgif_common::ComplianceLimits

mod compliance;
mod estimate;
pub mod filters;
mod invoker;
mod quality;
mod request;

pub use compliance::{
    human_bytes, ComplianceChecker, ConversionReport, ExceededBy, FrameCountBackend,
};
pub use estimate::{estimate, Estimate};
pub use invoker::{Invocation, LogStream, TranscodeInvoker};
pub use quality::{QualityTable, MAX_BAYER_SCALE};
pub use request::{
    ConversionJob, Policy, PolicyTable, RawParameters, RequestBuilder, SourceInfo,
    MAX_FRAME_RATE, MAX_OUTPUT_WIDTH, MAX_PALETTE_SIZE, MIN_FRAME_RATE, MIN_PALETTE_SIZE,
};
