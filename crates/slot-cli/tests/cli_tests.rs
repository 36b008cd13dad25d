//! Integration tests for the `slotctl` CLI binary.
//!
//! These tests use `assert_cmd` and `predicates` to exercise the `open` and
//! `window` subcommands against a busy-calendar fixture, with "now" pinned so
//! the output is deterministic.

// `Command::cargo_bin` was deprecated in assert_cmd 2.1.2 in favor of
// `cargo::cargo_bin_cmd!`. Allow it until we migrate.
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

/// Helper: path to the busy.json fixture.
fn busy_json_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/busy.json")
}

/// Monday 2025-06-02, 08:00 in Asia/Kolkata.
const MONDAY_MORNING: &str = "2025-06-02T08:00:00+05:30";

fn slotctl() -> Command {
    let mut cmd = Command::cargo_bin("slotctl").unwrap();
    cmd.env_remove("ALLOWED_BOOKING_DAYS")
        .env_remove("CUSTOM_TZ")
        .env_remove("RUST_LOG");
    cmd
}

fn parse_stdout(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout must be JSON")
}

// ─────────────────────────────────────────────────────────────────────────────
// open subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn open_lists_grid_minus_busy_interval() {
    let output = slotctl()
        .args(["open", "--busy", busy_json_path(), "--date", "2025-06-02"])
        .args(["--now", MONDAY_MORNING])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = parse_stdout(&output);
    assert_eq!(value["date"], "2025-06-02");
    let slots: Vec<&str> = value["availableSlots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(slots.len(), 11);
    assert_eq!(slots.first(), Some(&"11:00"));
    assert_eq!(slots.last(), Some(&"16:30"));
    assert!(!slots.contains(&"11:30"));
}

#[test]
fn open_partial_overlap_blocks_both_slots() {
    // 14:00-15:10 covers 14:00, 14:30 and 15:00.
    slotctl()
        .args(["open", "--busy", busy_json_path(), "--date", "2025-06-03"])
        .args(["--now", MONDAY_MORNING])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"13:30\""))
        .stdout(predicate::str::contains("\"14:00\"").not())
        .stdout(predicate::str::contains("\"15:00\"").not())
        .stdout(predicate::str::contains("\"15:30\""));
}

#[test]
fn open_same_day_applies_lead_time() {
    let output = slotctl()
        .args(["open", "--busy", busy_json_path(), "--date", "2025-06-02"])
        .args(["--now", "2025-06-02T14:05:00+05:30"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = parse_stdout(&output);
    assert_eq!(value["availableSlots"], serde_json::json!(["16:30"]));
}

#[test]
fn open_defaults_to_today() {
    slotctl()
        .args(["open", "--busy", busy_json_path()])
        .args(["--now", MONDAY_MORNING])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"date\": \"2025-06-02\""));
}

#[test]
fn open_rejects_sunday() {
    slotctl()
        .args(["open", "--busy", busy_json_path(), "--date", "2025-06-08"])
        .args(["--now", MONDAY_MORNING])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Booking not allowed for this date"));
}

#[test]
fn open_rejects_date_beyond_window() {
    slotctl()
        .args(["open", "--busy", busy_json_path(), "--date", "2025-06-10"])
        .args(["--now", MONDAY_MORNING])
        .assert()
        .failure()
        .stderr(predicate::str::contains("beyond"));
}

#[test]
fn open_rejects_malformed_date() {
    slotctl()
        .args(["open", "--busy", busy_json_path(), "--date", "02/06/2025"])
        .args(["--now", MONDAY_MORNING])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn missing_busy_file_reports_path() {
    slotctl()
        .args(["open", "--busy", "/nonexistent/busy.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read busy file"));
}

#[test]
fn unknown_timezone_is_rejected() {
    slotctl()
        .args(["open", "--busy", busy_json_path(), "--timezone", "Mars/Olympus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown timezone"));
}

// ─────────────────────────────────────────────────────────────────────────────
// window subcommand
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn window_lists_every_open_date() {
    let output = slotctl()
        .args(["window", "--busy", busy_json_path(), "--now", MONDAY_MORNING])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value = parse_stdout(&output);
    let dates: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["date"].as_str().unwrap())
        .collect();
    assert_eq!(
        dates,
        vec![
            "2025-06-02",
            "2025-06-03",
            "2025-06-04",
            "2025-06-05",
            "2025-06-06",
            "2025-06-07",
            "2025-06-09",
        ]
    );
    // The 09:00-10:00 meeting on 06-05 is outside booking hours.
    assert_eq!(value[3]["availableSlots"].as_array().unwrap().len(), 12);
}

#[test]
fn window_length_follows_environment() {
    let output = slotctl()
        .env("ALLOWED_BOOKING_DAYS", "2")
        .args(["window", "--busy", busy_json_path(), "--now", MONDAY_MORNING])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(parse_stdout(&output).as_array().unwrap().len(), 3);
}

#[test]
fn verbose_logs_refresh_to_stderr() {
    slotctl()
        .args(["-v", "window", "--busy", busy_json_path(), "--now", MONDAY_MORNING])
        .assert()
        .success()
        .stderr(predicate::str::contains("slot cache refreshed"));
}
