use crate::events::LoggingStatus;

/// Errors surfaced by the sample/logging core.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Caller handed the core something it cannot process (e.g. an empty batch).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The log channel answered, but not with success. Never fatal.
    #[error("Log channel degraded: {0}")]
    ChannelDegraded(LoggingStatus),
    /// The log channel could not be reached at all.
    #[error("Log channel unavailable: {0}")]
    ChannelUnavailable(String),
}
