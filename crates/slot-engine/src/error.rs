//! Error types for slot-engine operations.

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    /// Malformed date, or a date outside the booking policy (past, beyond the
    /// rolling window, or a closed weekday).
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    /// A hold or booking precondition was violated.
    #[error("Slot {date} {} is unavailable", .time.format("%H:%M"))]
    SlotUnavailable { date: NaiveDate, time: NaiveTime },

    /// The external calendar fetch failed while rebuilding the window.
    /// The previous cache contents are left untouched.
    #[error("Refresh failed for {date}: {reason}")]
    RefreshFailed { date: NaiveDate, reason: String },

    #[error("Invalid attendee: {0}")]
    InvalidAttendee(String),

    /// The caller's external confirmation step failed. Any hold taken for the
    /// booking has been released.
    #[error("External booking failed: {0}")]
    ExternalBookingFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SlotError>;
