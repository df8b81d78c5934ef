// AccelWatch — Watch Face Driver
//
// Single owner of all per-batch state: the latest average, the logging
// status tracker, the batch counter and the log channel itself. Every batch
// from the sensor task goes through `on_batch` on the same thread, so none of
// this needs locking.

use chrono::NaiveDateTime;

use crate::aggregator::{axis_sums, AggregatorState};
use crate::channel::LogChannel;
use crate::config::FaceConfig;
use crate::error::WatchError;
use crate::events::{AveragedReading, BatteryState, LoggingStatus, Sample, StatusRecord};
use crate::render::Frame;
use crate::tracker::LoggingStatusTracker;

/// What happened while processing one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub reading: AveragedReading,
    pub status: LoggingStatus,
    /// The log channel was closed and reopened.
    pub rotated: bool,
    /// The display should be redrawn.
    pub redraw: bool,
}

pub struct WatchFace<C: LogChannel> {
    config: FaceConfig,
    channel: C,
    aggregator: AggregatorState,
    tracker: LoggingStatusTracker,
    batch_count: u32,
}

impl<C: LogChannel> WatchFace<C> {
    /// Open the log channel and start with an empty state.
    pub fn new(config: FaceConfig, mut channel: C) -> Result<Self, WatchError> {
        channel.open(&config.channel)?;
        log::info!(
            "Log channel {} open ({} B records, resumable: {})",
            config.channel.id,
            config.channel.record_size,
            config.channel.resumable
        );

        Ok(Self {
            config,
            channel,
            aggregator: AggregatorState::new(),
            tracker: LoggingStatusTracker::new(config.rotation),
            batch_count: 0,
        })
    }

    /// Log, average, then rotate if due. Empty batches are rejected before
    /// anything is written or counted.
    ///
    /// The reading is stored before rotation, so a failed reopen still leaves
    /// the batch fully processed; the error is returned afterwards.
    pub fn on_batch(&mut self, batch: &[Sample], now: NaiveDateTime) -> Result<BatchOutcome, WatchError> {
        if batch.is_empty() {
            return Err(WatchError::InvalidInput("empty sample batch".into()));
        }
        log::debug!("+ {}", batch.len());

        self.batch_count = self.batch_count.wrapping_add(1);

        let logged = self.tracker.record(batch, &mut self.channel, now)?;
        log::debug!("{}", logged.status);
        if let Err(e) = logged.status.check() {
            log::warn!("{}", e);
        }

        let sums = axis_sums(batch);
        log::debug!("observed {} {} {} ({})", sums[0], sums[1], sums[2], self.batch_count % 100);

        let reading = self.aggregator.update_from_sums(sums, batch.len())?;
        log::debug!(
            "average {} {} {} |a| {} (dev {})",
            reading.x,
            reading.y,
            reading.z,
            reading.magnitude(),
            reading.gravity_deviation()
        );

        if logged.rotate {
            self.rotate()?;
        }

        Ok(BatchOutcome {
            reading,
            status: logged.status,
            rotated: logged.rotate,
            redraw: self.config.redraw.is_due(self.batch_count),
        })
    }

    fn rotate(&mut self) -> Result<(), WatchError> {
        self.channel.close();
        self.channel.open(&self.config.channel)?;
        log::debug!("logged");
        Ok(())
    }

    pub fn reading(&self) -> AveragedReading {
        self.aggregator.reading()
    }

    pub fn status(&self) -> StatusRecord {
        self.tracker.status_record()
    }

    pub fn batch_count(&self) -> u32 {
        self.batch_count
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Snapshot handed to the renderer.
    pub fn frame(&self, now: NaiveDateTime, battery: BatteryState, clock_24h: bool) -> Frame {
        Frame {
            reading: self.reading(),
            status: self.status(),
            now,
            battery,
            clock_24h,
        }
    }

    /// Seal the last session and give the channel back.
    pub fn shutdown(mut self) -> C {
        self.channel.close();
        log::info!("Log channel {} closed after {} batches", self.config.channel.id, self.batch_count);
        self.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemoryChannel;
    use crate::config::{Cadence, MEMORY_CHANNEL_CAPACITY};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(12, 30, 0).unwrap()
    }

    fn face() -> WatchFace<MemoryChannel> {
        WatchFace::new(FaceConfig::default(), MemoryChannel::new(MEMORY_CHANNEL_CAPACITY)).unwrap()
    }

    /// Fails every write, as if the storage service went away.
    struct DeadChannel;

    impl LogChannel for DeadChannel {
        fn open(&mut self, _config: &crate::config::ChannelConfig) -> Result<(), WatchError> {
            Ok(())
        }

        fn write(&mut self, _batch: &[Sample]) -> Result<LoggingStatus, WatchError> {
            Err(WatchError::ChannelUnavailable("storage service gone".into()))
        }

        fn close(&mut self) {}
    }

    /// Opens once, then refuses every reopen.
    struct ReopenFails {
        inner: MemoryChannel,
        opens: usize,
    }

    impl LogChannel for ReopenFails {
        fn open(&mut self, config: &crate::config::ChannelConfig) -> Result<(), WatchError> {
            self.opens += 1;
            if self.opens > 1 {
                return Err(WatchError::ChannelUnavailable("reopen refused".into()));
            }
            self.inner.open(config)
        }

        fn write(&mut self, batch: &[Sample]) -> Result<LoggingStatus, WatchError> {
            self.inner.write(batch)
        }

        fn close(&mut self) {
            self.inner.close();
        }
    }

    #[test]
    fn test_failed_rotation_still_stores_reading() {
        let channel = ReopenFails { inner: MemoryChannel::new(MEMORY_CHANNEL_CAPACITY), opens: 0 };
        let mut face = WatchFace::new(FaceConfig::default(), channel).unwrap();
        for _ in 0..4 {
            face.on_batch(&[Sample::new(1, 1, 1)], now()).unwrap();
        }

        let result = face.on_batch(&[Sample::new(9, 9, 9)], now());
        assert!(matches!(result, Err(WatchError::ChannelUnavailable(_))));
        assert_eq!(face.batch_count(), 5);
        assert_eq!(face.reading(), AveragedReading::new(9, 9, 9));
        // The fifth batch made it into the sealed session before the reopen failed.
        assert_eq!(face.channel().inner.finished_sessions()[0].records, 5);
    }

    #[test]
    fn test_new_opens_channel() {
        let face = face();
        assert!(face.channel().is_open());
        assert_eq!(face.status().status, LoggingStatus::Closed);
    }

    #[test]
    fn test_empty_batch_has_no_side_effects() {
        let mut face = face();
        assert!(matches!(face.on_batch(&[], now()), Err(WatchError::InvalidInput(_))));
        assert_eq!(face.batch_count(), 0);
        assert_eq!(face.channel().pending_records(), 0);
        assert_eq!(face.status().changed_at, None);
    }

    #[test]
    fn test_first_batch_reports_success() {
        let mut face = face();
        let outcome = face.on_batch(&[Sample::new(10, -20, 990)], now()).unwrap();
        assert_eq!(outcome.status, LoggingStatus::Success);
        assert_eq!(outcome.reading, AveragedReading::new(10, -20, 990));
        assert!(!outcome.rotated);
        assert!(!outcome.redraw);
        assert_eq!(face.status().changed_at, Some(now()));
    }

    #[test]
    fn test_rotation_seals_sessions() {
        let mut face = face();
        let batch = vec![Sample::new(0, 0, 1000); 2];
        for _ in 0..10 {
            face.on_batch(&batch, now()).unwrap();
        }
        let channel = face.shutdown();
        let records: Vec<usize> = channel.finished_sessions().iter().map(|s| s.records).collect();
        assert_eq!(records, vec![10, 10, 0]);
        assert!(channel.finished_sessions().iter().all(|s| s.channel_id == 1234));
    }

    #[test]
    fn test_redraw_every_fourth_batch() {
        let mut face = face();
        let redraws: Vec<u32> = (1..=12)
            .filter(|_| face.on_batch(&[Sample::new(1, 1, 1)], now()).unwrap().redraw)
            .collect();
        assert_eq!(redraws, vec![4, 8, 12]);
    }

    #[test]
    fn test_custom_cadence() {
        let config = FaceConfig {
            redraw: Cadence::new(1),
            rotation: Cadence::new(2),
            ..FaceConfig::default()
        };
        let mut face = WatchFace::new(config, MemoryChannel::new(100)).unwrap();
        let first = face.on_batch(&[Sample::new(1, 1, 1)], now()).unwrap();
        let second = face.on_batch(&[Sample::new(1, 1, 1)], now()).unwrap();
        assert!(first.redraw && !first.rotated);
        assert!(second.redraw && second.rotated);
    }

    #[test]
    fn test_busy_channel_keeps_success_time() {
        let mut face = face();
        let batch = [Sample::new(5, 5, 5)];
        face.on_batch(&batch, now()).unwrap();
        face.channel_mut().set_busy(true);
        let later = now() + chrono::Duration::minutes(5);
        let outcome = face.on_batch(&batch, later).unwrap();
        assert_eq!(outcome.status, LoggingStatus::Success);
        assert_eq!(face.status().changed_at, Some(now()));
    }

    #[test]
    fn test_full_channel_is_surfaced() {
        let mut face = WatchFace::new(FaceConfig::default(), MemoryChannel::new(3)).unwrap();
        let batch = vec![Sample::new(5, 5, 5); 2];
        face.on_batch(&batch, now()).unwrap();
        let outcome = face.on_batch(&batch, now()).unwrap();
        assert_eq!(outcome.status, LoggingStatus::Full);
        // The average is still updated even though nothing was logged.
        assert_eq!(outcome.reading, AveragedReading::new(5, 5, 5));
    }

    #[test]
    fn test_unreachable_channel_is_fatal() {
        let mut face = WatchFace::new(FaceConfig::default(), DeadChannel).unwrap();
        let result = face.on_batch(&[Sample::new(1, 2, 3)], now());
        assert!(matches!(result, Err(WatchError::ChannelUnavailable(_))));
    }

    #[test]
    fn test_frame_snapshot() {
        let mut face = face();
        face.on_batch(&[Sample::new(100, -200, 300)], now()).unwrap();
        let battery = BatteryState { charge_percent: 80, is_charging: true, is_plugged: true };
        let frame = face.frame(now(), battery, true);
        assert_eq!(frame.reading, AveragedReading::new(100, -200, 300));
        assert_eq!(frame.status, face.status());
        assert_eq!(frame.battery, battery);
    }
}
