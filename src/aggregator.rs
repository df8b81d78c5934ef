// AccelWatch — Batch Averaging
//
// Each accelerometer burst is reduced to one reading by summing every axis
// in a 64-bit accumulator and dividing by the batch length with Rust's
// truncating integer division.

use crate::error::WatchError;
use crate::events::{AveragedReading, Sample};

/// Per-axis mean of `batch`, truncated toward zero.
pub fn aggregate(batch: &[Sample]) -> Result<AveragedReading, WatchError> {
    average(axis_sums(batch), batch.len())
}

/// Mean from precomputed `axis_sums` over `len` samples.
pub(crate) fn average(sums: [i64; 3], len: usize) -> Result<AveragedReading, WatchError> {
    if len == 0 {
        return Err(WatchError::InvalidInput("cannot average an empty batch".into()));
    }
    let len = len as i64;

    // |sum / len| <= max |sample| <= i16::MAX, so the narrowing cannot fail.
    Ok(AveragedReading {
        x: (sums[0] / len) as i32,
        y: (sums[1] / len) as i32,
        z: (sums[2] / len) as i32,
    })
}

pub fn axis_sums(batch: &[Sample]) -> [i64; 3] {
    batch.iter().fold([0i64; 3], |mut acc, s| {
        acc[0] += i64::from(s.x);
        acc[1] += i64::from(s.y);
        acc[2] += i64::from(s.z);
        acc
    })
}

/// Latest averaged reading, overwritten by every batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregatorState {
    reading: AveragedReading,
}

impl AggregatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored reading with the average of `batch`. On error the
    /// previous reading is kept.
    pub fn update(&mut self, batch: &[Sample]) -> Result<AveragedReading, WatchError> {
        self.update_from_sums(axis_sums(batch), batch.len())
    }

    /// Same as `update`, for callers that already summed the batch.
    pub(crate) fn update_from_sums(&mut self, sums: [i64; 3], len: usize) -> Result<AveragedReading, WatchError> {
        self.reading = average(sums, len)?;
        Ok(self.reading)
    }

    pub fn reading(&self) -> AveragedReading {
        self.reading
    }
}
