//! Conversion request builder.
//!
//! [`RequestBuilder::build`] turns loosely typed form input
//! ([`RawParameters`]) into a [`ConversionJob`] whose every field is in
//! range. Whether an out-of-range value is rejected or corrected is decided
//! per field by the [`PolicyTable`]; nothing is clamped later on.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clipgif_av::MediaInfo;
use clipgif_common::paths::{ensure_gif_extension, output_candidate};
use clipgif_common::{DitherMode, Error, Field, Result};
use serde::{Deserialize, Serialize};

use super::quality::QualityTable;

pub const MIN_FRAME_RATE: u32 = 1;
pub const MAX_FRAME_RATE: u32 = 60;
pub const MIN_PALETTE_SIZE: u32 = 2;
pub const MAX_PALETTE_SIZE: u32 = 256;
/// GIF stores its logical screen width in 16 bits.
pub const MAX_OUTPUT_WIDTH: u32 = u16::MAX as u32;

/// Unvalidated conversion parameters as collected from a form or the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawParameters {
    pub source_path: PathBuf,
    /// Seconds into the source.
    pub start_time: f64,
    /// Seconds of source to convert.
    pub duration: f64,
    pub frame_rate: f64,
    pub quality: i64,
    pub output_width: i64,
    pub dither_mode: String,
    pub palette_size: i64,
    /// Explicit output file. `.gif` is appended when missing.
    pub output_path: Option<PathBuf>,
    /// Directory for the derived output name. Defaults to the source's
    /// directory. Ignored when `output_path` is set.
    pub output_dir: Option<PathBuf>,
}

impl Default for RawParameters {
    fn default() -> Self {
        Self {
            source_path: PathBuf::new(),
            start_time: 0.0,
            duration: 5.0,
            frame_rate: 25.0,
            quality: 3,
            output_width: 800,
            dither_mode: DitherMode::Bayer.to_string(),
            palette_size: 256,
            output_path: None,
            output_dir: None,
        }
    }
}

impl RawParameters {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            ..Self::default()
        }
    }
}

/// What is known about the source before conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceInfo {
    pub length: Option<Duration>,
    pub dimensions: Option<(u32, u32)>,
}

impl SourceInfo {
    pub fn from_media(info: &MediaInfo) -> Self {
        Self {
            length: info.duration,
            dimensions: info.dimensions(),
        }
    }
}

/// How a field reacts to an out-of-range value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Fail with a validation error.
    Reject,
    /// Bring the value into range and continue.
    Correct,
}

/// Per-field correction policy.
///
/// | field          | `Correct` means                                   |
/// |----------------|---------------------------------------------------|
/// | `duration`     | trim to the remaining source length               |
/// | `frame_rate`   | round to an integer, clamp to 1..=60              |
/// | `quality`      | clamp to the quality scale                        |
/// | `output_width` | clamp to 65535, then round odd widths down to even |
/// | `palette_size` | clamp to 2..=256                                  |
///
/// Values that can never be corrected (negative times, ranges whose end
/// does not fit in a `Duration`, zero or negative widths, unknown dither
/// names) are rejected regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTable {
    pub duration: Policy,
    pub frame_rate: Policy,
    pub quality: Policy,
    pub output_width: Policy,
    pub palette_size: Policy,
}

impl PolicyTable {
    /// Reject everything, including odd widths.
    pub const STRICT: PolicyTable = PolicyTable {
        duration: Policy::Reject,
        frame_rate: Policy::Reject,
        quality: Policy::Reject,
        output_width: Policy::Reject,
        palette_size: Policy::Reject,
    };
}

impl Default for PolicyTable {
    /// Only the output width is corrected.
    fn default() -> Self {
        Self {
            output_width: Policy::Correct,
            ..Self::STRICT
        }
    }
}

/// A fully validated conversion, ready to hand to the invoker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionJob {
    source_path: PathBuf,
    start_time: Duration,
    duration: Duration,
    frame_rate: u32,
    quality: u32,
    bayer_scale: u8,
    output_width: u32,
    dither_mode: DitherMode,
    palette_size: u32,
    output_path: PathBuf,
    source_length: Option<Duration>,
    source_dimensions: Option<(u32, u32)>,
}

impl ConversionJob {
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn start_time(&self) -> Duration {
        self.start_time
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// End of the selected range in the source.
    pub fn end_time(&self) -> Duration {
        self.start_time.saturating_add(self.duration)
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Level on the quality scale.
    pub fn quality(&self) -> u32 {
        self.quality
    }

    /// `paletteuse` bayer_scale resolved from the quality level.
    pub fn bayer_scale(&self) -> u8 {
        self.bayer_scale
    }

    pub fn output_width(&self) -> u32 {
        self.output_width
    }

    pub fn dither_mode(&self) -> DitherMode {
        self.dither_mode
    }

    pub fn palette_size(&self) -> u32 {
        self.palette_size
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Source length known when the job was built.
    pub fn source_length(&self) -> Option<Duration> {
        self.source_length
    }

    pub fn source_dimensions(&self) -> Option<(u32, u32)> {
        self.source_dimensions
    }
}

/// Validates [`RawParameters`] into [`ConversionJob`]s.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    quality: QualityTable,
    policy: PolicyTable,
}

impl RequestBuilder {
    pub fn new(quality: QualityTable, policy: PolicyTable) -> Self {
        Self { quality, policy }
    }

    pub fn quality_table(&self) -> &QualityTable {
        &self.quality
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    /// Validate `raw` against what is known about the source.
    ///
    /// Only inspects the filesystem; nothing is created. Building twice
    /// from the same input yields equal jobs unless the output name became
    /// occupied in between.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] naming the first offending field, or
    /// [`Error::Resource`] if the output directory is unusable.
    pub fn build(&self, raw: &RawParameters, source: &SourceInfo) -> Result<ConversionJob> {
        check_source(&raw.source_path)?;
        let (start_time, duration) = self.time_range(raw.start_time, raw.duration, source.length)?;
        let frame_rate = self.frame_rate(raw.frame_rate)?;
        let (quality, bayer_scale) = self.quality_level(raw.quality)?;
        let output_width = self.output_width(raw.output_width)?;
        let dither_mode = raw
            .dither_mode
            .parse::<DitherMode>()
            .map_err(|e| Error::validation(Field::DitherMode, e))?;
        let palette_size = self.palette_size(raw.palette_size)?;
        let output_path = resolve_output_path(raw)?;

        let job = ConversionJob {
            source_path: raw.source_path.clone(),
            start_time,
            duration,
            frame_rate,
            quality,
            bayer_scale,
            output_width,
            dither_mode,
            palette_size,
            output_path,
            source_length: source.length,
            source_dimensions: source.dimensions,
        };
        tracing::debug!(?job, "built conversion job");
        Ok(job)
    }

    fn time_range(
        &self,
        start: f64,
        duration: f64,
        length: Option<Duration>,
    ) -> Result<(Duration, Duration)> {
        if !start.is_finite() || start < 0.0 {
            return Err(Error::validation(
                Field::StartTime,
                format!("must be a non-negative number of seconds, got {start}"),
            ));
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(Error::validation(
                Field::Duration,
                format!("must be a positive number of seconds, got {duration}"),
            ));
        }
        let start = Duration::try_from_secs_f64(start)
            .map_err(|e| Error::validation(Field::StartTime, e.to_string()))?;
        let mut duration = Duration::try_from_secs_f64(duration)
            .map_err(|e| Error::validation(Field::Duration, e.to_string()))?;
        if start.checked_add(duration).is_none() {
            return Err(Error::validation(
                Field::Duration,
                "range ends beyond the largest representable time",
            ));
        }

        if let Some(length) = length {
            if start >= length {
                return Err(Error::validation(
                    Field::StartTime,
                    format!(
                        "starts at {:.3}s but the source is only {:.3}s long",
                        start.as_secs_f64(),
                        length.as_secs_f64()
                    ),
                ));
            }
            if start + duration > length {
                match self.policy.duration {
                    Policy::Reject => {
                        return Err(Error::validation(
                            Field::Duration,
                            format!(
                                "range ends at {:.3}s but the source is only {:.3}s long",
                                (start + duration).as_secs_f64(),
                                length.as_secs_f64()
                            ),
                        ))
                    }
                    Policy::Correct => duration = length - start,
                }
            }
        }
        Ok((start, duration))
    }

    fn frame_rate(&self, fps: f64) -> Result<u32> {
        if !fps.is_finite() {
            return Err(Error::validation(Field::FrameRate, "must be a number"));
        }
        let in_range = (f64::from(MIN_FRAME_RATE)..=f64::from(MAX_FRAME_RATE)).contains(&fps);
        if fps.fract() == 0.0 && in_range {
            return Ok(fps as u32);
        }
        match self.policy.frame_rate {
            Policy::Reject if fps.fract() != 0.0 => Err(Error::validation(
                Field::FrameRate,
                format!("must be a whole number of frames per second, got {fps}"),
            )),
            Policy::Reject => Err(Error::validation(
                Field::FrameRate,
                format!("must be between {MIN_FRAME_RATE} and {MAX_FRAME_RATE}, got {fps}"),
            )),
            Policy::Correct => {
                Ok(fps.round().clamp(f64::from(MIN_FRAME_RATE), f64::from(MAX_FRAME_RATE)) as u32)
            }
        }
    }

    fn quality_level(&self, level: i64) -> Result<(u32, u8)> {
        let levels = self.quality.levels();
        let level = match u32::try_from(level) {
            Ok(l) if (1..=levels).contains(&l) => l,
            _ => match self.policy.quality {
                Policy::Reject => {
                    return Err(Error::validation(
                        Field::Quality,
                        format!("must be between 1 and {levels}, got {level}"),
                    ))
                }
                Policy::Correct => level.clamp(1, i64::from(levels)) as u32,
            },
        };
        let bayer_scale = self.quality.bayer_scale(level).ok_or_else(|| {
            Error::validation(Field::Quality, format!("level {level} is not on the scale"))
        })?;
        Ok((level, bayer_scale))
    }

    fn output_width(&self, width: i64) -> Result<u32> {
        if width <= 0 {
            return Err(Error::validation(
                Field::OutputWidth,
                format!("must be positive, got {width}"),
            ));
        }
        let width = u32::try_from(width).unwrap_or(u32::MAX);
        let width = if width > MAX_OUTPUT_WIDTH {
            match self.policy.output_width {
                Policy::Reject => {
                    return Err(Error::validation(
                        Field::OutputWidth,
                        format!("must be at most {MAX_OUTPUT_WIDTH}, got {width}"),
                    ))
                }
                Policy::Correct => MAX_OUTPUT_WIDTH,
            }
        } else {
            width
        };
        if width % 2 == 0 {
            return Ok(width);
        }
        match self.policy.output_width {
            Policy::Reject => Err(Error::validation(
                Field::OutputWidth,
                format!("must be even, got {width}"),
            )),
            Policy::Correct => {
                let even = width - 1;
                if even == 0 {
                    return Err(Error::validation(
                        Field::OutputWidth,
                        "rounds down to 0 pixels",
                    ));
                }
                tracing::debug!("output width {} rounded down to {}", width, even);
                Ok(even)
            }
        }
    }

    fn palette_size(&self, size: i64) -> Result<u32> {
        let range = i64::from(MIN_PALETTE_SIZE)..=i64::from(MAX_PALETTE_SIZE);
        if range.contains(&size) {
            return Ok(size as u32);
        }
        match self.policy.palette_size {
            Policy::Reject => Err(Error::validation(
                Field::PaletteSize,
                format!(
                    "must be between {MIN_PALETTE_SIZE} and {MAX_PALETTE_SIZE} colours, got {size}"
                ),
            )),
            Policy::Correct => Ok(size.clamp(*range.start(), *range.end()) as u32),
        }
    }
}

fn check_source(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::validation(Field::SourcePath, "no source selected"));
    }
    if !path.exists() {
        return Err(Error::validation(
            Field::SourcePath,
            format!("{} does not exist", path.display()),
        ));
    }
    if !path.is_file() {
        return Err(Error::validation(
            Field::SourcePath,
            format!("{} is not a file", path.display()),
        ));
    }
    File::open(path).map_err(|e| {
        Error::validation(
            Field::SourcePath,
            format!("{} is not readable: {e}", path.display()),
        )
    })?;
    Ok(())
}

/// Pick the first free name in `<stem>.gif`, `<stem>_(1).gif`, ...
fn resolve_output_path(raw: &RawParameters) -> Result<PathBuf> {
    let (dir, stem) = match &raw.output_path {
        Some(path) => {
            let path = ensure_gif_extension(path);
            let dir = parent_or_current(&path);
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    Error::validation(Field::OutputPath, format!("{} has no file name", path.display()))
                })?;
            (dir, stem)
        }
        None => {
            let dir = raw
                .output_dir
                .clone()
                .unwrap_or_else(|| parent_or_current(&raw.source_path));
            let stem = raw
                .source_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            (dir, stem)
        }
    };

    check_output_dir(&dir)?;

    (0u64..)
        .map(|index| output_candidate(&dir, &stem, index))
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| Error::resource(&dir, "no free output name"))
}

fn parent_or_current(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn check_output_dir(dir: &Path) -> Result<()> {
    let metadata = std::fs::metadata(dir)
        .map_err(|e| Error::resource(dir, format!("output directory is not accessible: {e}")))?;
    if !metadata.is_dir() {
        return Err(Error::resource(dir, "output location is not a directory"));
    }
    if metadata.permissions().readonly() {
        return Err(Error::resource(dir, "output directory is read-only"));
    }
    check_writable(dir)
}

/// Ask the kernel whether this process may create entries in `dir`.
/// Mode bits alone miss directories owned by someone else and read-only
/// mounts.
#[cfg(unix)]
fn check_writable(dir: &Path) -> Result<()> {
    use nix::unistd::{access, AccessFlags};

    access(dir, AccessFlags::W_OK | AccessFlags::X_OK).map_err(|errno| {
        Error::resource(dir, format!("output directory is not writable: {errno}"))
    })
}

#[cfg(not(unix))]
fn check_writable(_dir: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn source() -> (tempfile::TempDir, RawParameters) {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("clip.mp4");
        std::fs::write(&src, b"not really a video").unwrap();
        (dir, RawParameters::new(src))
    }

    fn field_of(result: Result<ConversionJob>) -> Option<Field> {
        result.err().and_then(|e| e.field())
    }

    #[test]
    fn defaults_build() {
        let (dir, raw) = source();
        let job = RequestBuilder::default()
            .build(&raw, &SourceInfo::default())
            .unwrap();
        assert_eq!(job.start_time(), Duration::ZERO);
        assert_eq!(job.duration(), Duration::from_secs(5));
        assert_eq!(job.frame_rate(), 25);
        assert_eq!(job.quality(), 3);
        assert_eq!(job.bayer_scale(), 1);
        assert_eq!(job.output_width(), 800);
        assert_eq!(job.dither_mode(), DitherMode::Bayer);
        assert_eq!(job.palette_size(), 256);
        assert_eq!(job.output_path(), dir.path().join("clip.gif"));
    }

    #[test]
    fn missing_source_is_rejected() {
        let raw = RawParameters::new("/nonexistent/clip.mp4");
        let result = RequestBuilder::default().build(&raw, &SourceInfo::default());
        assert_eq!(field_of(result), Some(Field::SourcePath));
    }

    #[test]
    fn directory_source_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let raw = RawParameters::new(dir.path());
        let result = RequestBuilder::default().build(&raw, &SourceInfo::default());
        assert_eq!(field_of(result), Some(Field::SourcePath));
    }

    #[test]
    fn time_range_rules() {
        let (_dir, raw) = source();
        let builder = RequestBuilder::default();
        let unknown = SourceInfo::default();

        let r = RawParameters { start_time: -1.0, ..raw.clone() };
        assert_eq!(field_of(builder.build(&r, &unknown)), Some(Field::StartTime));

        let r = RawParameters { duration: 0.0, ..raw.clone() };
        assert_eq!(field_of(builder.build(&r, &unknown)), Some(Field::Duration));

        let r = RawParameters { duration: f64::NAN, ..raw.clone() };
        assert_eq!(field_of(builder.build(&r, &unknown)), Some(Field::Duration));

        // Unknown length tolerates any range.
        let r = RawParameters { start_time: 500.0, duration: 60.0, ..raw.clone() };
        assert!(builder.build(&r, &unknown).is_ok());
    }

    #[test]
    fn range_beyond_known_length() {
        let (_dir, raw) = source();
        let known = SourceInfo {
            length: Some(Duration::from_secs(8)),
            dimensions: None,
        };
        let r = RawParameters { start_time: 4.0, duration: 5.0, ..raw.clone() };

        let strict = RequestBuilder::default();
        assert_eq!(field_of(strict.build(&r, &known)), Some(Field::Duration));

        let lenient = RequestBuilder::new(
            QualityTable::default(),
            PolicyTable { duration: Policy::Correct, ..PolicyTable::default() },
        );
        let job = lenient.build(&r, &known).unwrap();
        assert_eq!(job.duration(), Duration::from_secs(4));
        assert_eq!(job.end_time(), Duration::from_secs(8));

        let r = RawParameters { start_time: 8.0, ..raw };
        assert_eq!(field_of(lenient.build(&r, &known)), Some(Field::StartTime));
    }

    #[test]
    fn frame_rate_rules() {
        let (_dir, raw) = source();
        let builder = RequestBuilder::default();
        let unknown = SourceInfo::default();

        for fps in [0.0, 61.0, 12.5, -5.0] {
            let r = RawParameters { frame_rate: fps, ..raw.clone() };
            assert_eq!(field_of(builder.build(&r, &unknown)), Some(Field::FrameRate), "{fps}");
        }
        for fps in [1.0, 60.0] {
            let r = RawParameters { frame_rate: fps, ..raw.clone() };
            assert_eq!(builder.build(&r, &unknown).unwrap().frame_rate(), fps as u32);
        }

        let lenient = RequestBuilder::new(
            QualityTable::default(),
            PolicyTable { frame_rate: Policy::Correct, ..PolicyTable::default() },
        );
        let r = RawParameters { frame_rate: 12.5, ..raw.clone() };
        assert_eq!(lenient.build(&r, &unknown).unwrap().frame_rate(), 13);
        let r = RawParameters { frame_rate: 120.0, ..raw };
        assert_eq!(lenient.build(&r, &unknown).unwrap().frame_rate(), 60);
    }

    #[test]
    fn quality_follows_table() {
        let (_dir, raw) = source();
        let builder = RequestBuilder::new(
            QualityTable::new(vec![4, 2]).unwrap(),
            PolicyTable::default(),
        );
        let unknown = SourceInfo::default();

        let r = RawParameters { quality: 2, ..raw.clone() };
        let job = builder.build(&r, &unknown).unwrap();
        assert_eq!((job.quality(), job.bayer_scale()), (2, 2));

        for q in [0, 3, -1] {
            let r = RawParameters { quality: q, ..raw.clone() };
            assert_eq!(field_of(builder.build(&r, &unknown)), Some(Field::Quality));
        }
    }

    #[test]
    fn width_rules() {
        let (_dir, raw) = source();
        let unknown = SourceInfo::default();
        let builder = RequestBuilder::default();

        for w in [0, -2, 1] {
            let r = RawParameters { output_width: w, ..raw.clone() };
            assert_eq!(field_of(builder.build(&r, &unknown)), Some(Field::OutputWidth), "{w}");
        }

        let strict = RequestBuilder::new(QualityTable::default(), PolicyTable::STRICT);
        let r = RawParameters { output_width: 101, ..raw.clone() };
        assert_eq!(field_of(strict.build(&r, &unknown)), Some(Field::OutputWidth));

        let r = RawParameters { output_width: 1_000_000_000, ..raw.clone() };
        assert_eq!(field_of(strict.build(&r, &unknown)), Some(Field::OutputWidth));
        assert_eq!(builder.build(&r, &unknown).unwrap().output_width(), 65_534);

        let r = RawParameters { output_width: i64::MAX, ..raw };
        assert_eq!(builder.build(&r, &unknown).unwrap().output_width(), 65_534);
    }

    #[test]
    fn range_end_must_be_representable() {
        let (_dir, raw) = source();
        let r = RawParameters { start_time: 1.5e19, duration: 1.5e19, ..raw.clone() };
        let err = RequestBuilder::default()
            .build(&r, &SourceInfo::default())
            .unwrap_err();
        assert_matches!(err, Error::Validation { field: Field::Duration, .. });

        let r = RawParameters { start_time: 1.5e19, duration: 1.0, ..raw };
        let job = RequestBuilder::default().build(&r, &SourceInfo::default()).unwrap();
        assert!(job.end_time() > job.start_time());
    }

    #[test]
    fn dither_mode_must_be_known() {
        let (_dir, raw) = source();
        let r = RawParameters { dither_mode: "ordered".into(), ..raw.clone() };
        let result = RequestBuilder::default().build(&r, &SourceInfo::default());
        assert_eq!(field_of(result), Some(Field::DitherMode));

        let r = RawParameters { dither_mode: "floyd_steinberg".into(), ..raw };
        let job = RequestBuilder::default().build(&r, &SourceInfo::default()).unwrap();
        assert_eq!(job.dither_mode(), DitherMode::FloydSteinberg);
    }

    #[test]
    fn palette_correct_policy_clamps() {
        let (_dir, raw) = source();
        let lenient = RequestBuilder::new(
            QualityTable::default(),
            PolicyTable { palette_size: Policy::Correct, ..PolicyTable::default() },
        );
        let r = RawParameters { palette_size: 1000, ..raw.clone() };
        assert_eq!(lenient.build(&r, &SourceInfo::default()).unwrap().palette_size(), 256);
        let r = RawParameters { palette_size: 0, ..raw };
        assert_eq!(lenient.build(&r, &SourceInfo::default()).unwrap().palette_size(), 2);
    }

    #[test]
    fn explicit_output_path_gets_gif_extension() {
        let (dir, raw) = source();
        let r = RawParameters {
            output_path: Some(dir.path().join("result")),
            ..raw
        };
        let job = RequestBuilder::default().build(&r, &SourceInfo::default()).unwrap();
        assert_eq!(job.output_path(), dir.path().join("result.gif"));
    }

    #[test]
    fn output_dir_must_exist() {
        let (dir, raw) = source();
        let r = RawParameters {
            output_dir: Some(dir.path().join("missing")),
            ..raw
        };
        let err = RequestBuilder::default()
            .build(&r, &SourceInfo::default())
            .unwrap_err();
        assert_matches!(err, Error::Resource { .. });
    }

    #[cfg(unix)]
    #[test]
    fn unwritable_output_dir_is_rejected() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, raw) = source();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();
        let r = RawParameters {
            output_dir: Some(locked.clone()),
            ..raw.clone()
        };
        let err = RequestBuilder::default()
            .build(&r, &SourceInfo::default())
            .unwrap_err();
        assert_matches!(err, Error::Resource { .. });
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        // Writable mode bits, but owned by root.
        if !nix::unistd::geteuid().is_root() {
            let r = RawParameters {
                output_dir: Some(PathBuf::from("/")),
                ..raw
            };
            let err = RequestBuilder::default()
                .build(&r, &SourceInfo::default())
                .unwrap_err();
            assert_matches!(err, Error::Resource { .. });
        }
    }

    #[test]
    fn source_info_from_media() {
        let info = MediaInfo {
            file_path: PathBuf::from("clip.mp4"),
            file_size: 10,
            container: "mov,mp4".into(),
            duration: Some(Duration::from_secs(3)),
            video: Some(clipgif_av::VideoStream {
                codec: "h264".into(),
                width: 640,
                height: 360,
                frame_rate: Some(30.0),
                frame_count: None,
            }),
        };
        let source = SourceInfo::from_media(&info);
        assert_eq!(source.length, Some(Duration::from_secs(3)));
        assert_eq!(source.dimensions, Some((640, 360)));
    }
}
