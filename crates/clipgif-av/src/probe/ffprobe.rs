//! FFprobe-based media probing and frame counting.

use super::types::{MediaInfo, VideoStream};
use crate::command::ToolCommand;
use crate::tools::FFPROBE;
use clipgif_common::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Upper bound for a single ffprobe run. Counting frames decodes the whole
/// stream, so this is generous.
const PROBE_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    #[serde(default)]
    format_name: String,
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_frames: Option<String>,
    nb_read_frames: Option<String>,
}

/// Probe a media file's container and first video stream.
pub async fn probe_with_ffprobe(ffprobe: &Path, path: &Path) -> Result<MediaInfo> {
    let output = ToolCommand::new(ffprobe.to_path_buf())
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
            "-select_streams",
            "v:0",
        ])
        .arg(path.to_string_lossy())
        .timeout(PROBE_TIMEOUT)
        .execute()
        .await?;

    parse_probe_output(path, &output.stdout)
}

/// Count the frames of the first video stream by decoding it.
pub async fn count_frames_with_ffprobe(ffprobe: &Path, path: &Path) -> Result<u64> {
    let output = ToolCommand::new(ffprobe.to_path_buf())
        .args([
            "-v",
            "error",
            "-count_frames",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=nb_read_frames",
            "-print_format",
            "json",
        ])
        .arg(path.to_string_lossy())
        .timeout(PROBE_TIMEOUT)
        .execute()
        .await?;

    parse_frame_count_output(&output.stdout)
}

fn parse_json(json: &str) -> Result<FfprobeOutput> {
    serde_json::from_str(json).map_err(|e| Error::parse(FFPROBE, format!("invalid JSON: {e}")))
}

fn parse_probe_output(path: &Path, json: &str) -> Result<MediaInfo> {
    let output = parse_json(json)?;
    let format = output
        .format
        .ok_or_else(|| Error::parse(FFPROBE, "missing format section"))?;

    let duration = format
        .duration
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .map(Duration::from_secs_f64);

    let video = output
        .streams
        .into_iter()
        .find(|s| s.codec_type.as_deref().unwrap_or("video") == "video")
        .map(|s| VideoStream {
            codec: s.codec_name.unwrap_or_default(),
            width: s.width.unwrap_or(0),
            height: s.height.unwrap_or(0),
            frame_rate: s.r_frame_rate.as_deref().and_then(parse_frame_rate),
            frame_count: s.nb_frames.and_then(|n| n.parse().ok()),
        });

    Ok(MediaInfo {
        file_path: path.to_path_buf(),
        file_size: format.size.and_then(|s| s.parse().ok()).unwrap_or(0),
        container: format.format_name,
        duration,
        video,
    })
}

fn parse_frame_count_output(json: &str) -> Result<u64> {
    let output = parse_json(json)?;
    let stream = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| Error::parse(FFPROBE, "no video stream"))?;
    let raw = stream
        .nb_read_frames
        .ok_or_else(|| Error::parse(FFPROBE, "nb_read_frames missing"))?;
    raw.trim()
        .parse()
        .map_err(|_| Error::parse(FFPROBE, format!("nb_read_frames is not a number: {raw}")))
}

/// Parse an ffprobe rational such as `30000/1001` or a plain number.
pub fn parse_frame_rate(rate_str: &str) -> Option<f64> {
    if let Some((num, den)) = rate_str.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        return (den != 0.0).then(|| num / den);
    }
    rate_str.parse().ok()
}
