// AccelWatch — Core Library
//
// Batch averaging, log-channel health tracking and the watch face that ties
// them to a display. Everything here runs on the host; the ESP32 firmware
// in `main.rs` only adds drivers and tasks around it.

pub mod aggregator;
pub mod channel;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod face;
pub mod numeric;
pub mod render;
pub mod tracker;

#[cfg(not(target_os = "espidf"))]
pub mod logger;


pub use aggregator::aggregate;
pub use channel::{LogChannel, MemoryChannel};
pub use error::WatchError;
pub use events::{AveragedReading, BatteryState, LoggingStatus, Sample, StatusRecord};
pub use face::{BatchOutcome, WatchFace};
pub use numeric::{format_signed_milli, isqrt};
pub use tracker::LoggingStatusTracker;
