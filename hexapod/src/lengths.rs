use serde::{Deserialize, Serialize};

use crate::errors::{AcquisitionError, HexapodError};

pub const STRUT_COUNT: usize = 6;

/// Six strut lengths, index-aligned with the anchor point sets.
///
/// Every entry is finite and non-negative.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(try_from = "[f64; 6]", into = "[f64; 6]")]
pub struct StrutLengths([f64; STRUT_COUNT]);

impl StrutLengths {
    pub fn new(lengths: [f64; STRUT_COUNT]) -> Result<Self, HexapodError> {
        for (strut, &length) in lengths.iter().enumerate() {
            if !length.is_finite() || length < 0.0 {
                return Err(HexapodError::InvalidLength { strut, length });
            }
        }
        Ok(Self(lengths))
    }

    /// Wraps lengths that are distances by construction.
    pub(crate) fn from_distances(lengths: [f64; STRUT_COUNT]) -> Self {
        Self(lengths)
    }

    /// Converts a raw integer reading into lengths.
    pub fn from_counts(counts: &[i64; STRUT_COUNT], scale: &ReadingScale) -> Result<Self, AcquisitionError> {
        let mut lengths = [0.0; STRUT_COUNT];
        for (index, (&count, length)) in counts.iter().zip(lengths.iter_mut()).enumerate() {
            let value = scale.apply(count);
            if !value.is_finite() || value < 0.0 {
                return Err(AcquisitionError::InvalidLength { index });
            }
            *length = value;
        }
        Ok(Self(lengths))
    }

    pub fn as_array(&self) -> &[f64; STRUT_COUNT] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    /// Largest element-wise absolute difference.
    pub fn max_abs_diff(&self, other: &StrutLengths) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }

    /// Element-wise comparison with an absolute tolerance.
    pub fn all_close(&self, other: &StrutLengths, tolerance: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl std::ops::Index<usize> for StrutLengths {
    type Output = f64;

    fn index(&self, strut: usize) -> &f64 {
        &self.0[strut]
    }
}

impl TryFrom<[f64; STRUT_COUNT]> for StrutLengths {
    type Error = HexapodError;

    fn try_from(lengths: [f64; STRUT_COUNT]) -> Result<Self, Self::Error> {
        Self::new(lengths)
    }
}

impl From<StrutLengths> for [f64; STRUT_COUNT] {
    fn from(lengths: StrutLengths) -> Self {
        lengths.0
    }
}

/// Maps raw device counts to length units: `length = count * units_per_count + offset`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ReadingScale {
    pub units_per_count: f64,
    pub offset: f64,
}

impl ReadingScale {
    pub fn apply(&self, count: i64) -> f64 {
        count as f64 * self.units_per_count + self.offset
    }
}

impl Default for ReadingScale {
    fn default() -> Self {
        Self {
            units_per_count: 1.0,
            offset: 0.0,
        }
    }
}
