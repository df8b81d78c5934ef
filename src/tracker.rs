// AccelWatch — Logging Status Tracker
//
// Forwards every batch to the log channel, debounces the returned status
// and counts calls so the owner knows when the channel is due for rotation.
// The tracker never opens or closes the channel itself.

use chrono::NaiveDateTime;

use crate::channel::LogChannel;
use crate::config::Cadence;
use crate::error::WatchError;
use crate::events::{LoggingStatus, Sample, StatusRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Debounced status after this call.
    pub status: LoggingStatus,
    /// The caller must close and reopen the channel now.
    pub rotate: bool,
}

#[derive(Debug, Clone)]
pub struct LoggingStatusTracker {
    current: StatusRecord,
    call_count: u32,
    rotation: Cadence,
}

impl LoggingStatusTracker {
    pub fn new(rotation: Cadence) -> Self {
        Self {
            current: StatusRecord::default(),
            call_count: 0,
            rotation,
        }
    }

    pub fn status_record(&self) -> StatusRecord {
        self.current
    }

    pub fn status(&self) -> LoggingStatus {
        self.current.status
    }

    pub fn call_count(&self) -> u32 {
        self.call_count
    }

    /// Write `batch` to `channel` and fold the result into the tracked status.
    ///
    /// Only an unreachable channel is reported as an error; every status code
    /// the channel returns is classified, not propagated.
    pub fn record<C: LogChannel + ?Sized>(
        &mut self,
        batch: &[Sample],
        channel: &mut C,
        now: NaiveDateTime,
    ) -> Result<RecordOutcome, WatchError> {
        let raw = channel.write(batch)?;
        Ok(self.observe(raw, now))
    }

    /// Apply one raw channel result.
    pub fn observe(&mut self, raw: LoggingStatus, now: NaiveDateTime) -> RecordOutcome {
        let current = self.current.status;
        if raw != current && !LoggingStatus::is_benign_flip(current, raw) {
            log::debug!("Log status {} -> {}", current, raw);
            self.current = StatusRecord {
                status: raw,
                changed_at: Some(now),
            };
        }

        self.call_count = self.call_count.wrapping_add(1);

        RecordOutcome {
            status: self.current.status,
            rotate: self.rotation.is_due(self.call_count),
        }
    }
}
