//! # clipgif-av
//!
//! External tool management and media probing for clipgif.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- locate ffmpeg and ffprobe from a
//!   configured path, a bundled per-platform location, or `PATH`.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout,
//!   cancellation and line-by-line stderr streaming. Children are killed
//!   when their command future is dropped.
//! - **Workspace management** ([`Workspace`]) -- temporary directory for
//!   intermediate files, with staged output moved into place on success.
//! - **Probing** ([`probe`]) -- ffprobe metadata and exact frame counting,
//!   natively for GIF files or through ffprobe otherwise.
//!
//! ## Example
//!
//! ```no_run
//! use clipgif_av::{ToolRegistry, ToolsConfig, FFPROBE};
//!
//! # async fn example() -> clipgif_common::Result<()> {
//! let tools = ToolRegistry::discover(&ToolsConfig::default());
//! let ffprobe = tools.require(FFPROBE)?;
//! let info = clipgif_av::probe::probe_with_ffprobe(&ffprobe.path, "clip.mp4".as_ref()).await?;
//! println!("duration: {:?}", info.duration);
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod probe;
pub mod progress;
pub mod tools;
pub mod workspace;

pub use command::{ToolCommand, ToolOutput};
pub use probe::{
    CompositeFrameCounter, FfprobeFrameCounter, FrameCounter, GifFrameCounter, MediaInfo,
    VideoStream,
};
pub use progress::ProgressTracker;
pub use tools::{Platform, ToolConfig, ToolInfo, ToolRegistry, ToolsConfig, FFMPEG, FFPROBE};
pub use workspace::Workspace;
