//! Booking policy: rolling window, slot grid, hold and lead-time durations.
//!
//! All "local" dates and times are interpreted in [`SlotConfig::timezone`]. The
//! calendar date of `now` in that timezone is "today".

use chrono::{
    DateTime, Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// Configuration values consumed by the cache.
///
/// Every field has a default, so a partially specified config deserializes
/// to the defaults for the missing fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotConfig {
    /// Rolling window length N: dates `[today, today + N]` are cached.
    pub booking_days: u32,
    /// Width of each slot in minutes.
    pub slot_minutes: u32,
    /// First slot start (local time).
    pub day_start: NaiveTime,
    /// End of the booking window (local time); no slot extends past it.
    pub day_end: NaiveTime,
    /// How long a hold blocks a slot before it lapses.
    pub hold_seconds: u32,
    /// Same-day buffer: slots starting at or before `now + lead` are hidden.
    pub lead_time_minutes: u32,
    /// Weekdays on which the calendar is closed.
    pub closed_weekdays: Vec<Weekday>,
    /// IANA timezone of the calendar.
    pub timezone: Tz,
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self {
            booking_days: 7,
            slot_minutes: 30,
            day_start: NaiveTime::from_hms_opt(11, 0, 0).unwrap_or_default(),
            day_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
            hold_seconds: 120,
            lead_time_minutes: 120,
            closed_weekdays: vec![Weekday::Sun],
            timezone: chrono_tz::Asia::Kolkata,
        }
    }
}

impl SlotConfig {
    /// Check that the values describe a usable slot grid.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidConfig` when the slot width is zero or does
    /// not divide the booking hours evenly, when `day_start >= day_end`, or when
    /// the hold duration is zero.
    pub fn validate(&self) -> Result<()> {
        if self.slot_minutes == 0 {
            return Err(SlotError::InvalidConfig(
                "slot_minutes must be positive".to_string(),
            ));
        }
        if self.day_start >= self.day_end {
            return Err(SlotError::InvalidConfig(format!(
                "day_start {} must be before day_end {}",
                self.day_start.format("%H:%M"),
                self.day_end.format("%H:%M")
            )));
        }
        let span = (self.day_end - self.day_start).num_minutes();
        if span % i64::from(self.slot_minutes) != 0 {
            return Err(SlotError::InvalidConfig(format!(
                "slot_minutes {} does not divide the {}-minute booking window",
                self.slot_minutes, span
            )));
        }
        if self.hold_seconds == 0 {
            return Err(SlotError::InvalidConfig(
                "hold_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn slot_width(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_minutes))
    }

    pub fn hold_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.hold_seconds))
    }

    pub fn lead_time(&self) -> Duration {
        Duration::minutes(i64::from(self.lead_time_minutes))
    }

    /// Calendar date of `now` in the configured timezone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// Wall-clock reading of `now` in the configured timezone.
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.timezone).naive_local()
    }

    /// Convert a local date and time of day to UTC.
    ///
    /// Ambiguous local times (DST fold) resolve to the earlier instant; times
    /// that do not exist (DST gap) yield `None`.
    pub fn local_to_utc(&self, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
        self.timezone
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn is_closed(&self, date: NaiveDate) -> bool {
        self.closed_weekdays.contains(&date.weekday())
    }

    /// Last date of the rolling window that starts at `today`.
    pub fn last_window_date(&self, today: NaiveDate) -> NaiveDate {
        today
            .checked_add_days(Days::new(u64::from(self.booking_days)))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Whether `date` may be queried or booked when the local date is `today`.
    pub fn is_bookable(&self, date: NaiveDate, today: NaiveDate) -> bool {
        self.check_bookable(date, today).is_ok()
    }

    /// Like [`is_bookable`](Self::is_bookable) but reports why a date is refused.
    pub fn check_bookable(&self, date: NaiveDate, today: NaiveDate) -> Result<()> {
        if date < today {
            return Err(SlotError::InvalidDate(format!("{date} is in the past")));
        }
        if date > self.last_window_date(today) {
            return Err(SlotError::InvalidDate(format!(
                "{date} is beyond the {}-day booking window",
                self.booking_days
            )));
        }
        if self.is_closed(date) {
            return Err(SlotError::InvalidDate(format!(
                "{date} falls on a closed weekday ({})",
                date.weekday()
            )));
        }
        Ok(())
    }

    /// Open (non-closed) dates of `[today, today + booking_days]`, ascending.
    pub fn window_dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let last = self.last_window_date(today);
        today
            .iter_days()
            .take_while(|d| *d <= last)
            .filter(|d| !self.is_closed(*d))
            .collect()
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
///
/// # Errors
/// Returns `SlotError::InvalidDate` if the string is not a valid date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| SlotError::InvalidDate(format!("'{s}': {e}")))
}

/// Parse an `HH:MM` time of day.
///
/// # Errors
/// Returns `SlotError::InvalidTime` if the string is not a valid time.
pub fn parse_time_of_day(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| SlotError::InvalidTime(format!("'{s}': {e}")))
}
