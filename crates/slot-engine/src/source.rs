//! Capabilities the cache consumes from the external calendar.
//!
//! Both traits are async and object-safe so the service can hold them as
//! `Arc<dyn ...>`. Implementations own their own timeouts and credentials.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A busy period reported by the external calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Half-open overlap test: touching intervals do not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }
}

/// The person a booking is made for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub reason: Option<String>,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}

/// Failure reported by an external collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SourceError(pub String);

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Authoritative free/busy data.
#[async_trait]
pub trait BusySource: Send + Sync {
    /// Busy intervals overlapping `[window_start, window_end)`, the booking
    /// hours of `date`.
    async fn fetch_busy_intervals(
        &self,
        date: NaiveDate,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SourceError>;
}

/// Creates the real calendar event for a booking.
#[async_trait]
pub trait BookingConfirmer: Send + Sync {
    /// Returns the external confirmation id.
    async fn confirm_external_booking(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        attendee: &Attendee,
    ) -> Result<String, SourceError>;
}
