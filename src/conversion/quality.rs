//! Mapping from user-facing quality levels to `paletteuse` parameters.

use clipgif_common::{Error, Field, Result};
use serde::{Deserialize, Serialize};

/// Largest `bayer_scale` ffmpeg accepts.
pub const MAX_BAYER_SCALE: u8 = 5;

/// Quality scale as a lookup table: level `n` (1-based) uses the `n`-th
/// `bayer_scale`. Lower scales give stronger ordered dithering, which looks
/// finer but compresses worse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct QualityTable {
    bayer_scales: Vec<u8>,
}

impl QualityTable {
    /// Build a table from per-level `bayer_scale` values.
    pub fn new(bayer_scales: Vec<u8>) -> Result<Self> {
        if bayer_scales.is_empty() {
            return Err(Error::validation(
                Field::Quality,
                "quality table needs at least one level",
            ));
        }
        if let Some(bad) = bayer_scales.iter().find(|&&s| s > MAX_BAYER_SCALE) {
            return Err(Error::validation(
                Field::Quality,
                format!("bayer_scale {bad} is out of range 0..={MAX_BAYER_SCALE}"),
            ));
        }
        Ok(Self { bayer_scales })
    }

    /// Number of levels; valid levels are `1..=levels()`.
    pub fn levels(&self) -> u32 {
        self.bayer_scales.len() as u32
    }

    /// Encoder parameter for `level`, or `None` if it is off the scale.
    pub fn bayer_scale(&self, level: u32) -> Option<u8> {
        let index = usize::try_from(level).ok()?.checked_sub(1)?;
        self.bayer_scales.get(index).copied()
    }
}

impl Default for QualityTable {
    /// Four levels: low, balanced, high, maximum.
    fn default() -> Self {
        Self {
            bayer_scales: vec![5, 3, 1, 0],
        }
    }
}

impl TryFrom<Vec<u8>> for QualityTable {
    type Error = Error;

    fn try_from(value: Vec<u8>) -> Result<Self> {
        Self::new(value)
    }
}

impl From<QualityTable> for Vec<u8> {
    fn from(table: QualityTable) -> Self {
        table.bayer_scales
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let table = QualityTable::default();
        assert_eq!(table.levels(), 4);
        assert_eq!(table.bayer_scale(1), Some(5));
        assert_eq!(table.bayer_scale(3), Some(1));
        assert_eq!(table.bayer_scale(4), Some(0));
        assert_eq!(table.bayer_scale(0), None);
        assert_eq!(table.bayer_scale(5), None);
    }

    #[test]
    fn rejects_bad_tables() {
        assert!(QualityTable::new(vec![]).is_err());
        assert!(QualityTable::new(vec![2, 6]).is_err());
        assert!(QualityTable::new(vec![4, 2]).is_ok());
    }

    #[test]
    fn deserializes_from_list() {
        let table: QualityTable = serde_json::from_str("[4, 2, 0]").unwrap();
        assert_eq!(table.levels(), 3);
        assert!(serde_json::from_str::<QualityTable>("[9]").is_err());
    }
}
