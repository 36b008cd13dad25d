//! Tests for the slot grid and busy-interval subtraction.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use slot_engine::grid::{day_window, open_slots, slot_starts};
use slot_engine::{BusyInterval, SlotConfig};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn utc_config() -> SlotConfig {
    SlotConfig {
        timezone: chrono_tz::UTC,
        ..SlotConfig::default()
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

/// Busy interval on 2025-06-02 between two UTC wall-clock times.
fn busy(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> BusyInterval {
    BusyInterval::new(
        Utc.with_ymd_and_hms(2025, 6, 2, start_h, start_m, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 6, 2, end_h, end_m, 0).unwrap(),
    )
}

fn full_grid() -> Vec<NaiveTime> {
    (0..12).map(|i| hm(11 + i / 2, (i % 2) * 30)).collect()
}

// ── Grid construction ───────────────────────────────────────────────────────

#[test]
fn default_grid_is_twelve_half_hours_from_eleven() {
    let starts = slot_starts(&utc_config());
    assert_eq!(starts, full_grid());
    assert_eq!(starts.first(), Some(&hm(11, 0)));
    assert_eq!(starts.last(), Some(&hm(16, 30)));
}

#[test]
fn hour_wide_slots_halve_the_grid() {
    let config = SlotConfig {
        slot_minutes: 60,
        ..utc_config()
    };
    let starts = slot_starts(&config);
    assert_eq!(starts.len(), 6);
    assert_eq!(starts[5], hm(16, 0));
}

#[test]
fn day_window_converts_local_hours_to_utc() {
    // Asia/Kolkata is UTC+05:30: 11:00 IST = 05:30 UTC, 17:00 IST = 11:30 UTC.
    let config = SlotConfig::default();
    let (start, end) = day_window(&config, day()).unwrap();
    assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 2, 5, 30, 0).unwrap());
    assert_eq!(end, Utc.with_ymd_and_hms(2025, 6, 2, 11, 30, 0).unwrap());
}

// ── Busy subtraction ────────────────────────────────────────────────────────

#[test]
fn no_busy_intervals_leaves_every_slot_open() {
    let open = open_slots(&utc_config(), day(), &[]);
    assert_eq!(open.into_iter().collect::<Vec<_>>(), full_grid());
}

#[test]
fn single_busy_half_hour_removes_one_slot() {
    let open = open_slots(&utc_config(), day(), &[busy(11, 30, 12, 0)]);
    assert_eq!(open.len(), 11);
    assert!(!open.contains(&hm(11, 30)));
    assert!(open.contains(&hm(11, 0)), "meeting starting at slot end is not a conflict");
    assert!(open.contains(&hm(12, 0)), "meeting ending at slot start is not a conflict");
}

#[test]
fn partial_overlap_blocks_whole_slot() {
    // 12:10-12:40 touches both the 12:00 and 12:30 slots.
    let open = open_slots(&utc_config(), day(), &[busy(12, 10, 12, 40)]);
    assert!(!open.contains(&hm(12, 0)));
    assert!(!open.contains(&hm(12, 30)));
    assert_eq!(open.len(), 10);
}

#[test]
fn overlapping_busy_intervals_block_their_union() {
    let open = open_slots(
        &utc_config(),
        day(),
        &[busy(13, 0, 14, 0), busy(13, 30, 14, 30), busy(14, 30, 15, 0)],
    );
    for t in [hm(13, 0), hm(13, 30), hm(14, 0), hm(14, 30)] {
        assert!(!open.contains(&t), "{t} should be busy");
    }
    assert!(open.contains(&hm(12, 30)));
    assert!(open.contains(&hm(15, 0)));
}

#[test]
fn busy_interval_order_does_not_matter() {
    let sorted = [busy(11, 0, 11, 30), busy(13, 15, 13, 45), busy(16, 30, 17, 0)];
    let mut reversed = sorted;
    reversed.reverse();
    let open = open_slots(&utc_config(), day(), &reversed);
    assert_eq!(open, open_slots(&utc_config(), day(), &sorted));
    assert_eq!(open.len(), 8);
}

#[test]
fn busy_interval_covering_whole_day_closes_it() {
    let all_day = BusyInterval::new(
        Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2025, 6, 3, 0, 0, 0).unwrap(),
    );
    assert!(open_slots(&utc_config(), day(), &[all_day]).is_empty());
}

#[test]
fn busy_intervals_outside_booking_hours_are_ignored() {
    let open = open_slots(
        &utc_config(),
        day(),
        &[busy(8, 0, 11, 0), busy(17, 0, 18, 0)],
    );
    assert_eq!(open.len(), 12);
}

#[test]
fn busy_intervals_use_calendar_timezone() {
    // 11:30-12:00 IST is 06:00-06:30 UTC.
    let config = SlotConfig::default();
    let open = open_slots(&config, day(), &[busy(6, 0, 6, 30)]);
    assert_eq!(open.len(), 11);
    assert!(!open.contains(&hm(11, 30)));
}
