use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "clipgif")]
#[command(author, version, about = "Convert video clips into GIFs that fit platform limits")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a video clip into a GIF
    Convert {
        #[command(flatten)]
        params: ConversionArgs,

        /// Abort after this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Convert even if the estimate exceeds the frame limit
        #[arg(long)]
        ignore_limits: bool,

        /// Print the compliance report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate frame count and size without converting
    Estimate {
        #[command(flatten)]
        params: ConversionArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a GIF against the size and frame limits
    Check {
        /// GIF to check
        #[arg(required = true)]
        file: PathBuf,

        /// Override the maximum size in bytes
        #[arg(long)]
        max_bytes: Option<u64>,

        /// Override the maximum frame count
        #[arg(long)]
        max_frames: Option<u64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Probe a media file and display information
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

/// Conversion parameters. Anything not given falls back to the config's
/// `[defaults]` section.
#[derive(Args, Debug, Clone)]
pub struct ConversionArgs {
    /// Source video
    #[arg(required = true)]
    pub input: PathBuf,

    /// Output file (".gif" is appended when missing)
    #[arg(short, long, conflicts_with = "output_dir")]
    pub output: Option<PathBuf>,

    /// Directory for the output file
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Start offset in seconds
    #[arg(short, long)]
    pub start: Option<f64>,

    /// Length of the clip in seconds
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Frames per second (1-60)
    #[arg(long)]
    pub fps: Option<f64>,

    /// Quality level (1 = smallest file)
    #[arg(short, long)]
    pub quality: Option<i64>,

    /// Output width in pixels; height follows the aspect ratio
    #[arg(short, long)]
    pub width: Option<i64>,

    /// Dither algorithm (none, bayer, heckbert, floyd_steinberg, sierra2, sierra2_4a)
    #[arg(long)]
    pub dither: Option<String>,

    /// Palette size (2-256)
    #[arg(long)]
    pub colors: Option<i64>,

    /// Reject out-of-range values instead of correcting odd widths
    #[arg(long)]
    pub strict: bool,
}
