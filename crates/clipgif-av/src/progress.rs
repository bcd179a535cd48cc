//! Parsing of ffmpeg `-progress pipe:2` output.
//!
//! ffmpeg writes blocks of `key=value` lines, each block terminated by
//! `progress=continue` or `progress=end`. [`ProgressTracker`] folds those
//! lines into an [`EncodeProgress`] snapshot per block.

use std::time::Duration;

/// Progress of one encoding pass at the end of a progress block.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeProgress {
    /// Fraction of the expected duration encoded, 0.0..=1.0.
    pub pct: f64,
    /// Frames written so far.
    pub frame: Option<u64>,
    /// Encoding speed as reported (e.g. "2.5x").
    pub speed: Option<String>,
    /// Whether this was the final block.
    pub finished: bool,
}

/// Accumulates progress keys until a block ends.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    expected: Duration,
    out_time_us: Option<i64>,
    frame: Option<u64>,
    speed: Option<String>,
}

impl ProgressTracker {
    /// Track a pass expected to produce `expected` worth of output.
    pub fn new(expected: Duration) -> Self {
        Self {
            expected,
            out_time_us: None,
            frame: None,
            speed: None,
        }
    }

    /// Feed one stderr line. Returns a snapshot when the line closes a block.
    pub fn feed(&mut self, line: &str) -> Option<EncodeProgress> {
        let (key, value) = line.split_once('=')?;
        let value = value.trim();
        match key.trim() {
            "out_time_us" => self.out_time_us = value.parse().ok(),
            "frame" => self.frame = value.parse().ok(),
            "speed" if value != "N/A" => self.speed = Some(value.to_string()),
            "progress" => {
                let finished = value == "end";
                return Some(EncodeProgress {
                    pct: if finished { 1.0 } else { self.fraction() },
                    frame: self.frame,
                    speed: self.speed.clone(),
                    finished,
                });
            }
            _ => {}
        }
        None
    }

    fn fraction(&self) -> f64 {
        let expected = self.expected.as_secs_f64();
        match self.out_time_us {
            Some(us) if expected > 0.0 => (us as f64 / 1_000_000.0 / expected).clamp(0.0, 1.0),
            _ => 0.0,
        }
    }
}
