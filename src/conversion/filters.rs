//! ffmpeg argument lists for the two-pass palette encode.
//!
//! Pass 1 builds an optimal palette from the selected range; pass 2 maps the
//! same frames onto it with the requested dithering.

use std::path::Path;
use std::time::Duration;

use super::request::ConversionJob;

/// Arguments shared by both passes, up to and including the source input.
fn input_args(job: &ConversionJob) -> Vec<String> {
    vec![
        "-y".into(),
        "-hide_banner".into(),
        "-nostats".into(),
        "-progress".into(),
        "pipe:2".into(),
        "-ss".into(),
        seconds(job.start_time()),
        "-t".into(),
        seconds(job.duration()),
        "-i".into(),
        job.source_path().to_string_lossy().into_owned(),
    ]
}

/// `fps=F,scale=W:-1:flags=lanczos`
pub fn frame_filter(job: &ConversionJob) -> String {
    format!(
        "fps={},scale={}:-1:flags=lanczos",
        job.frame_rate(),
        job.output_width()
    )
}

/// Pass 1: write the palette image to `palette`.
pub fn palette_args(job: &ConversionJob, palette: &Path) -> Vec<String> {
    let mut args = input_args(job);
    args.push("-vf".into());
    args.push(format!(
        "{},palettegen=max_colors={}:stats_mode=full",
        frame_filter(job),
        job.palette_size()
    ));
    args.push(palette.to_string_lossy().into_owned());
    args
}

/// Pass 2: encode the GIF to `output` using `palette`.
pub fn encode_args(job: &ConversionJob, palette: &Path, output: &Path) -> Vec<String> {
    let mut args = input_args(job);
    args.push("-i".into());
    args.push(palette.to_string_lossy().into_owned());
    args.push("-lavfi".into());
    args.push(format!(
        "{} [x]; [x][1:v] paletteuse=dither={}:bayer_scale={}",
        frame_filter(job),
        job.dither_mode().as_ffmpeg(),
        job.bayer_scale()
    ));
    args.push(output.to_string_lossy().into_owned());
    args
}

/// Seconds with millisecond precision, as ffmpeg's time options accept.
pub fn seconds(d: Duration) -> String {
    format!("{:.3}", d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversion::{RawParameters, RequestBuilder, SourceInfo};

    fn job(dir: &Path) -> ConversionJob {
        let src = dir.join("clip.mp4");
        std::fs::write(&src, b"x").unwrap();
        let raw = RawParameters {
            start_time: 1.5,
            duration: 4.0,
            frame_rate: 15.0,
            quality: 2,
            output_width: 480,
            dither_mode: "sierra2_4a".into(),
            palette_size: 128,
            ..RawParameters::new(src)
        };
        RequestBuilder::default()
            .build(&raw, &SourceInfo::default())
            .unwrap()
    }

    #[test]
    fn palette_pass() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let args = palette_args(&job, Path::new("/tmp/ws/palette.png"));
        let src = dir.path().join("clip.mp4").to_string_lossy().into_owned();
        assert_eq!(
            args,
            vec![
                "-y", "-hide_banner", "-nostats", "-progress", "pipe:2",
                "-ss", "1.500", "-t", "4.000", "-i", src.as_str(),
                "-vf",
                "fps=15,scale=480:-1:flags=lanczos,palettegen=max_colors=128:stats_mode=full",
                "/tmp/ws/palette.png",
            ]
        );
    }

    #[test]
    fn encode_pass() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let args = encode_args(
            &job,
            Path::new("/tmp/ws/palette.png"),
            Path::new("/tmp/ws/clip.gif"),
        );
        let lavfi = args.iter().position(|a| a == "-lavfi").unwrap();
        assert_eq!(
            args[lavfi + 1],
            "fps=15,scale=480:-1:flags=lanczos [x]; [x][1:v] paletteuse=dither=sierra2_4a:bayer_scale=3"
        );
        assert_eq!(args[lavfi - 2], "-i");
        assert_eq!(args[lavfi - 1], "/tmp/ws/palette.png");
        assert_eq!(args.last().unwrap(), "/tmp/ws/clip.gif");
    }

    #[test]
    fn arguments_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        let palette = Path::new("p.png");
        assert_eq!(palette_args(&job, palette), palette_args(&job, palette));
    }

    #[test]
    fn seconds_format() {
        assert_eq!(seconds(Duration::ZERO), "0.000");
        assert_eq!(seconds(Duration::from_millis(12_345)), "12.345");
    }
}
