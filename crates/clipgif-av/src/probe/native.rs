//! Native GIF frame counting.

use clipgif_common::{Error, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Count the image frames of a GIF file by decoding it.
///
/// Blocking; run it on a blocking thread from async code.
pub fn count_gif_frames(path: &Path) -> Result<u64> {
    let file = File::open(path)
        .map_err(|e| Error::resource(path, format!("failed to open: {e}")))?;

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);

    let mut decoder = options
        .read_info(BufReader::new(file))
        .map_err(|e| Error::parse("gif", e.to_string()))?;

    let mut frames = 0u64;
    while decoder
        .read_next_frame()
        .map_err(|e| Error::parse("gif", e.to_string()))?
        .is_some()
    {
        frames += 1;
    }
    Ok(frames)
}
