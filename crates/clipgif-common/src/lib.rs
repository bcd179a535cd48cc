//! clipgif-common: shared types and errors.
//!
//! This crate provides functionality used across clipgif:
//!
//! - **Error taxonomy**: [`Error`] covers validation, missing tools, tool
//!   failures, filesystem problems, timeouts and cancellation
//! - **Core types**: [`DitherMode`], [`ComplianceLimits`] and the [`Field`]
//!   names used in validation errors
//! - **Path utilities**: `.gif` extension handling and output name candidates
//!
//! # Examples
//!
//! ```
//! use clipgif_common::{ComplianceLimits, DitherMode, Error, Field};
//! use clipgif_common::paths::ensure_gif_extension;
//! use std::path::Path;
//!
//! let limits = ComplianceLimits::default();
//! assert_eq!(limits.max_frames, 300);
//!
//! let dither: DitherMode = "floyd_steinberg".parse().unwrap();
//! assert_eq!(dither.as_ffmpeg(), "floyd_steinberg");
//!
//! assert_eq!(ensure_gif_extension(Path::new("clip")), Path::new("clip.gif"));
//!
//! let err = Error::validation(Field::PaletteSize, "must be between 2 and 256");
//! assert_eq!(err.field(), Some(Field::PaletteSize));
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
