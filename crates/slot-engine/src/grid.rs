//! Half-hour grid construction and busy-interval subtraction.
//!
//! Each candidate slot `[t, t + width)` is tested against every busy period.
//! A busy period overlaps a slot when `busy.start < t + width && busy.end > t`;
//! a meeting that ends exactly at `t` leaves the slot open.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::config::SlotConfig;
use crate::source::BusyInterval;

/// Local start times of every slot in the booking window, ascending.
pub fn slot_starts(config: &SlotConfig) -> Vec<NaiveTime> {
    if config.slot_minutes == 0 || config.day_start >= config.day_end {
        return Vec::new();
    }
    let width = config.slot_width();
    let count = (config.day_end - config.day_start).num_minutes() / width.num_minutes();
    (0..count)
        .map(|i| config.day_start + width * i as i32)
        .collect()
}

/// UTC bounds of the booking window on `date`, or `None` if either end falls
/// in a DST gap.
pub fn day_window(config: &SlotConfig, date: NaiveDate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = config.local_to_utc(date, config.day_start)?;
    let end = config.local_to_utc(date, config.day_end)?;
    Some((start, end))
}

/// Slot start times on `date` that no busy interval overlaps.
///
/// Slots whose local start does not exist (DST gap) are omitted.
pub fn open_slots(config: &SlotConfig, date: NaiveDate, busy: &[BusyInterval]) -> BTreeSet<NaiveTime> {
    let width = config.slot_width();
    slot_starts(config)
        .into_iter()
        .filter(|&t| {
            config
                .local_to_utc(date, t)
                .is_some_and(|start| !busy.iter().any(|b| b.overlaps(start, start + width)))
        })
        .collect()
}
