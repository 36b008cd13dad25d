//! `slotctl` CLI — query the slot reservation cache from the command line.
//!
//! The external calendar is stood in for by a JSON file of busy intervals.
//!
//! ## Usage
//!
//! ```sh
//! # Open slots for a date (defaults to today in the calendar timezone)
//! slotctl open --busy busy.json --date 2025-06-02
//!
//! # Pin "now" to replay a past moment
//! slotctl open --busy busy.json --date 2025-06-02 --now 2025-06-02T14:05:00+05:30
//!
//! # Every cached day of the rolling window
//! slotctl window --busy busy.json
//!
//! # Shorter window, UTC calendar, debug logging
//! ALLOWED_BOOKING_DAYS=3 CUSTOM_TZ=UTC slotctl -v window --busy busy.json
//! ```
//!
//! The busy file is a JSON array of `{"start": RFC3339, "end": RFC3339}`.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use slot_engine::{
    BusyInterval, BusySource, Clock, ManualClock, SlotConfig, SlotService, SourceError,
    SystemClock,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "slotctl",
    version,
    about = "Inspect the slot reservation cache against a busy-calendar file"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    policy: PolicyArgs,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct PolicyArgs {
    /// Rolling window length in days (today through today + N)
    #[arg(long, env = "ALLOWED_BOOKING_DAYS", default_value_t = 7, global = true)]
    booking_days: u32,

    /// IANA timezone of the calendar
    #[arg(long, env = "CUSTOM_TZ", default_value = "Asia/Kolkata", global = true)]
    timezone: String,

    /// Hold duration in seconds
    #[arg(long, default_value_t = 120, global = true)]
    hold_seconds: u32,

    /// Same-day lead time in minutes
    #[arg(long, default_value_t = 120, global = true)]
    lead_minutes: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// List open slots for one date
    Open {
        /// JSON file of busy intervals
        #[arg(short, long)]
        busy: String,
        /// Date as YYYY-MM-DD (today if omitted)
        #[arg(short, long)]
        date: Option<String>,
        /// Override the current time (RFC 3339)
        #[arg(long)]
        now: Option<String>,
    },
    /// List open slots for every date in the rolling window
    Window {
        /// JSON file of busy intervals
        #[arg(short, long)]
        busy: String,
        /// Override the current time (RFC 3339)
        #[arg(long)]
        now: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DaySlots {
    date: String,
    available_slots: Vec<String>,
}

/// Busy intervals loaded once from a JSON file.
struct FileBusySource {
    intervals: Vec<BusyInterval>,
}

impl FileBusySource {
    fn load(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read busy file: {}", path))?;
        let intervals: Vec<BusyInterval> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse busy file: {}", path))?;
        Ok(Self { intervals })
    }
}

#[async_trait]
impl BusySource for FileBusySource {
    async fn fetch_busy_intervals(
        &self,
        _date: NaiveDate,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, SourceError> {
        Ok(self
            .intervals
            .iter()
            .filter(|b| b.overlaps(window_start, window_end))
            .copied()
            .collect())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let config = build_config(&cli.policy)?;

    match cli.command {
        Commands::Open { busy, date, now } => {
            let service = build_service(config, &busy, now.as_deref())?;
            let date = match date {
                Some(raw) => slot_engine::parse_date(&raw)?,
                None => service.today(),
            };
            service
                .check_date(date)
                .context("Booking not allowed for this date")?;

            let slots = service
                .get_open_slots(date)
                .await
                .context("Failed to load slots")?;
            print_json(&day_slots(date, &slots))?;
        }
        Commands::Window { busy, now } => {
            let service = build_service(config, &busy, now.as_deref())?;
            service.refresh().await.context("Failed to refresh slots")?;

            let mut days = Vec::new();
            for date in service.cached_dates() {
                let slots = service
                    .get_open_slots(date)
                    .await
                    .context("Failed to load slots")?;
                days.push(day_slots(date, &slots));
            }
            print_json(&days)?;
        }
    }

    Ok(())
}

fn init_logger(verbose: bool) {
    let default = if verbose {
        "slot_engine=debug,info"
    } else {
        "slot_engine=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal())
                .with_target(false)
                .compact(),
        )
        .init();
}

fn build_config(policy: &PolicyArgs) -> Result<SlotConfig> {
    let timezone: Tz = policy
        .timezone
        .parse()
        .map_err(|_| anyhow::anyhow!("Unknown timezone: '{}'", policy.timezone))?;
    let config = SlotConfig {
        booking_days: policy.booking_days,
        hold_seconds: policy.hold_seconds,
        lead_time_minutes: policy.lead_minutes,
        timezone,
        ..SlotConfig::default()
    };
    config.validate()?;
    Ok(config)
}

fn build_service(config: SlotConfig, busy: &str, now: Option<&str>) -> Result<SlotService> {
    let source = Arc::new(FileBusySource::load(busy)?);
    let clock: Arc<dyn Clock> = match now {
        Some(raw) => {
            let now = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("Invalid --now timestamp: {}", raw))?;
            Arc::new(ManualClock::new(now.with_timezone(&Utc)))
        }
        None => Arc::new(SystemClock),
    };
    Ok(SlotService::new(config, source, clock)?)
}

fn day_slots(date: NaiveDate, slots: &[NaiveTime]) -> DaySlots {
    DaySlots {
        date: date.format("%Y-%m-%d").to_string(),
        available_slots: slots.iter().map(|t| t.format("%H:%M").to_string()).collect(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let pretty = serde_json::to_string_pretty(value)?;
    println!("{}", pretty);
    Ok(())
}
