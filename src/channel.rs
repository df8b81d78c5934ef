// AccelWatch — Append-only Log Channel
//
// The face never owns the storage behind a log channel; it only writes
// batches, reads back a status code and asks for rotation. `MemoryChannel`
// is the in-RAM implementation used by the firmware and the simulation.

use std::io::{self, Write};

use crate::config::*;
use crate::error::WatchError;
use crate::events::{LoggingStatus, Sample};

pub trait LogChannel {
    /// Start a session. Re-opening a resumable channel continues its
    /// session numbering.
    fn open(&mut self, config: &ChannelConfig) -> Result<(), WatchError>;

    /// Append one batch. `Err` means the channel could not be reached at all.
    fn write(&mut self, batch: &[Sample]) -> Result<LoggingStatus, WatchError>;

    /// Seal the current session. Closing a closed channel is a no-op.
    fn close(&mut self);
}

/// A sealed logging session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedSession {
    pub channel_id: u32,
    pub sequence: u32,
    pub records: usize,
    pub bytes: Vec<u8>,
}

impl FinishedSession {
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.bytes.chunks_exact(SAMPLE_RECORD_SIZE).map(|chunk| {
            let mut record = [0u8; SAMPLE_RECORD_SIZE];
            record.copy_from_slice(chunk);
            Sample::from_record(&record)
        })
    }

    /// One export line: `LOG <channel> <sequence> <records> <hex bytes>`.
    pub fn write_export<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "LOG {} {} {} ", self.channel_id, self.sequence, self.records)?;
        for byte in &self.bytes {
            write!(out, "{:02x}", byte)?;
        }
        writeln!(out)
    }
}

#[derive(Debug)]
struct OpenSession {
    config: ChannelConfig,
    sequence: u32,
    records: usize,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct MemoryChannel {
    capacity: usize,
    session: Option<OpenSession>,
    ever_opened: bool,
    busy: bool,
    next_sequence: u32,
    finished: Vec<FinishedSession>,
}

impl MemoryChannel {
    /// `capacity` is the maximum number of records per session.
    pub fn new(capacity: usize) -> Self {
        Self { capacity, ..Default::default() }
    }

    /// Simulate another writer holding the session.
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn pending_records(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.records)
    }

    pub fn finished_sessions(&self) -> &[FinishedSession] {
        &self.finished
    }

    /// Hand over sealed sessions, e.g. for export.
    pub fn take_finished(&mut self) -> Vec<FinishedSession> {
        std::mem::take(&mut self.finished)
    }
}

impl LogChannel for MemoryChannel {
    fn open(&mut self, config: &ChannelConfig) -> Result<(), WatchError> {
        if self.session.is_some() {
            self.close();
        }
        if !config.resumable {
            self.next_sequence = 0;
        }

        let sequence = self.next_sequence;
        self.session = Some(OpenSession {
            config: *config,
            sequence,
            records: 0,
            bytes: Vec::with_capacity(self.capacity.min(64) * config.record_size),
        });
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.ever_opened = true;

        log::debug!("Log channel {} opened (session {})", config.id, sequence);
        Ok(())
    }

    fn write(&mut self, batch: &[Sample]) -> Result<LoggingStatus, WatchError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(if self.ever_opened {
                LoggingStatus::Closed
            } else {
                LoggingStatus::NotFound
            });
        };

        if session.config.record_size != SAMPLE_RECORD_SIZE || batch.is_empty() {
            return Ok(LoggingStatus::InvalidParams);
        }
        if self.busy {
            return Ok(LoggingStatus::Busy);
        }
        if session.records + batch.len() > self.capacity {
            return Ok(LoggingStatus::Full);
        }

        for sample in batch {
            session.bytes.extend_from_slice(&sample.to_record());
        }
        session.records += batch.len();
        Ok(LoggingStatus::Success)
    }

    fn close(&mut self) {
        if let Some(session) = self.session.take() {
            log::debug!(
                "Log channel {} closed (session {}, {} records)",
                session.config.id,
                session.sequence,
                session.records
            );
            self.finished.push(FinishedSession {
                channel_id: session.config.id,
                sequence: session.sequence,
                records: session.records,
                bytes: session.bytes,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(n: usize) -> Vec<Sample> {
        (0..n).map(|i| Sample::new(i as i16, -(i as i16), 1000).at(i as u64)).collect()
    }

    #[test]
    fn test_never_opened_is_not_found() {
        let mut channel = MemoryChannel::new(10);
        assert_eq!(channel.write(&samples(1)).unwrap(), LoggingStatus::NotFound);
    }

    #[test]
    fn test_closed_after_close() {
        let mut channel = MemoryChannel::new(10);
        channel.open(&ChannelConfig::default()).unwrap();
        channel.close();
        assert_eq!(channel.write(&samples(1)).unwrap(), LoggingStatus::Closed);
    }

    #[test]
    fn test_full_rejects_whole_batch() {
        let mut channel = MemoryChannel::new(5);
        channel.open(&ChannelConfig::default()).unwrap();
        assert_eq!(channel.write(&samples(3)).unwrap(), LoggingStatus::Success);
        assert_eq!(channel.write(&samples(3)).unwrap(), LoggingStatus::Full);
        assert_eq!(channel.pending_records(), 3);
    }

    #[test]
    fn test_busy_writes_nothing() {
        let mut channel = MemoryChannel::new(10);
        channel.open(&ChannelConfig::default()).unwrap();
        channel.set_busy(true);
        assert_eq!(channel.write(&samples(2)).unwrap(), LoggingStatus::Busy);
        assert_eq!(channel.pending_records(), 0);
    }

    #[test]
    fn test_wrong_record_size_is_invalid() {
        let mut channel = MemoryChannel::new(10);
        let config = ChannelConfig { record_size: 6, ..ChannelConfig::default() };
        channel.open(&config).unwrap();
        assert_eq!(channel.write(&samples(1)).unwrap(), LoggingStatus::InvalidParams);
    }

    #[test]
    fn test_close_seals_session_records() {
        let mut channel = MemoryChannel::new(10);
        let config = ChannelConfig::default();
        channel.open(&config).unwrap();
        let batch = samples(4);
        channel.write(&batch).unwrap();
        channel.close();
        channel.open(&config).unwrap();
        channel.close();

        let finished = channel.take_finished();
        assert_eq!(finished.len(), 2);
        assert_eq!(finished[0].channel_id, 1234);
        assert_eq!(finished[0].records, 4);
        assert_eq!(finished[0].samples().collect::<Vec<_>>(), batch);
        assert_eq!(finished[1].sequence, 1);
        assert!(channel.finished_sessions().is_empty());
    }

    #[test]
    fn test_export_line() {
        let mut channel = MemoryChannel::new(10);
        channel.open(&ChannelConfig::default()).unwrap();
        channel.write(&[Sample::new(1, -1, 1000).at(5)]).unwrap();
        channel.close();

        let mut out = Vec::new();
        channel.finished_sessions()[0].write_export(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "LOG 1234 0 1 0100ffffe803000500000000000000\n"
        );
    }

    #[test]
    fn test_non_resumable_restarts_numbering() {
        let mut channel = MemoryChannel::new(10);
        let config = ChannelConfig { resumable: false, ..ChannelConfig::default() };
        channel.open(&config).unwrap();
        channel.open(&config).unwrap();
        channel.close();
        let sequences: Vec<u32> = channel.finished_sessions().iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![0, 0]);
    }
}
