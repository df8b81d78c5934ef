// AccelWatch — System Events & Data Types

use chrono::NaiveDateTime;

use crate::config::*;
use crate::error::WatchError;
use crate::numeric::isqrt;

// ---------------------------------------------------------------------------
// Raw accelerometer sample (milli-g per axis)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
    /// The vibration motor was running while this sample was taken.
    pub did_vibrate: bool,
    pub timestamp_ms: u64,
}

impl Sample {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z, did_vibrate: false, timestamp_ms: 0 }
    }

    pub const fn at(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    /// Fixed-size little-endian record written to the log channel.
    pub fn to_record(&self) -> [u8; SAMPLE_RECORD_SIZE] {
        let mut out = [0u8; SAMPLE_RECORD_SIZE];
        out[0..2].copy_from_slice(&self.x.to_le_bytes());
        out[2..4].copy_from_slice(&self.y.to_le_bytes());
        out[4..6].copy_from_slice(&self.z.to_le_bytes());
        out[6] = self.did_vibrate as u8;
        out[7..15].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        out
    }

    pub fn from_record(record: &[u8; SAMPLE_RECORD_SIZE]) -> Self {
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&record[7..15]);
        Self {
            x: i16::from_le_bytes([record[0], record[1]]),
            y: i16::from_le_bytes([record[2], record[3]]),
            z: i16::from_le_bytes([record[4], record[5]]),
            did_vibrate: record[6] != 0,
            timestamp_ms: u64::from_le_bytes(ts),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-batch average
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AveragedReading {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl AveragedReading {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn axes(&self) -> [i32; 3] {
        [self.x, self.y, self.z]
    }

    /// Vector length in the same units as the axes.
    pub fn magnitude(&self) -> u32 {
        let sum = self
            .axes()
            .iter()
            .map(|a| a.unsigned_abs().saturating_mul(a.unsigned_abs()))
            .fold(0u32, |acc, sq| acc.saturating_add(sq));
        isqrt(sum)
    }

    /// How far the reading is from a resting 1 g.
    pub fn gravity_deviation(&self) -> i32 {
        self.magnitude() as i32 - ACCEL_MAX
    }
}

// ---------------------------------------------------------------------------
// Log channel health
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoggingStatus {
    Success,
    Busy,
    Full,
    NotFound,
    Closed,
    InvalidParams,
}

impl LoggingStatus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Success       => "SUCCESS",
            Self::Busy          => "BUSY",
            Self::Full          => "FULL",
            Self::NotFound      => "NOT_FOUND",
            Self::Closed        => "CLOSED",
            Self::InvalidParams => "INVALID_PARAMS",
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Success)
    }

    pub fn check(self) -> Result<(), WatchError> {
        if self.is_degraded() {
            Err(WatchError::ChannelDegraded(self))
        } else {
            Ok(())
        }
    }

    /// Face shown next to the status timestamp.
    pub fn mood(&self) -> &'static str {
        match self {
            Self::Success => ":)",
            Self::Busy => ":|",
            Self::Full | Self::NotFound | Self::Closed | Self::InvalidParams => ":(",
        }
    }

    /// Healthy flip-flop that should not count as a state change.
    pub fn is_benign_flip(from: Self, to: Self) -> bool {
        matches!(
            (from, to),
            (Self::Success, Self::Busy) | (Self::Busy, Self::Success)
        )
    }
}

impl Default for LoggingStatus {
    fn default() -> Self {
        Self::Closed
    }
}

impl std::fmt::Display for LoggingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Debounced status plus the wall-clock time it last really changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusRecord {
    pub status: LoggingStatus,
    pub changed_at: Option<NaiveDateTime>,
}

// ---------------------------------------------------------------------------
// Battery
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryState {
    pub charge_percent: u8,
    pub is_charging: bool,
    pub is_plugged: bool,
}

impl Default for BatteryState {
    fn default() -> Self {
        Self { charge_percent: 100, is_charging: false, is_plugged: false }
    }
}

// ---------------------------------------------------------------------------
// Face events — sent to the face task via channel
// ---------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub enum FaceEvent {
    /// A burst of samples from the sensor task.
    Batch(Vec<Sample>),
    /// Battery state polled by the power task.
    Battery(BatteryState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_layout() {
        let sample = Sample { x: -2, y: 300, z: 1000, did_vibrate: true, timestamp_ms: 42 };
        let record = sample.to_record();
        assert_eq!(&record[0..2], &[0xFE, 0xFF]);
        assert_eq!(record[6], 1);
        assert_eq!(record[7], 42);
        assert_eq!(Sample::from_record(&record), sample);
    }

    #[test]
    fn test_magnitude_at_rest() {
        let reading = AveragedReading::new(0, 0, -1000);
        assert_eq!(reading.magnitude(), 1000);
        assert_eq!(reading.gravity_deviation(), 0);

        let tilted = AveragedReading::new(600, 0, 800);
        assert_eq!(tilted.magnitude(), 1000);
    }

    #[test]
    fn test_benign_flip_is_only_success_busy() {
        use LoggingStatus::*;
        assert!(LoggingStatus::is_benign_flip(Success, Busy));
        assert!(LoggingStatus::is_benign_flip(Busy, Success));
        assert!(!LoggingStatus::is_benign_flip(Busy, Full));
        assert!(!LoggingStatus::is_benign_flip(Closed, Success));
        assert!(!LoggingStatus::is_benign_flip(Success, Success));
    }

    #[test]
    fn test_degraded_check() {
        assert!(LoggingStatus::Success.check().is_ok());
        assert!(matches!(
            LoggingStatus::Full.check(),
            Err(WatchError::ChannelDegraded(LoggingStatus::Full))
        ));
    }

    #[test]
    fn test_mood() {
        assert_eq!(LoggingStatus::Success.mood(), ":)");
        assert_eq!(LoggingStatus::Busy.mood(), ":|");
        assert_eq!(LoggingStatus::NotFound.mood(), ":(");
    }
}
