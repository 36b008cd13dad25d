//! # slot-engine
//!
//! In-memory time-slot reservation cache for a single bookable calendar.
//!
//! Tracks, per calendar day, which fixed-width slots are available, provisionally
//! held, or booked, and reconciles that state against an external calendar on
//! demand. Holds expire lazily on read; a cold cache is rebuilt through a
//! single-flight refresh so concurrent readers never duplicate external fetches.
//!
//! ## Modules
//!
//! - [`config`] — Booking policy (window length, slot width, hours, hold, lead time)
//! - [`clock`] — Injectable wall clock
//! - [`slot`] — `SlotState`, `Slot`, `DaySchedule` and their transition rules
//! - [`grid`] — Half-hour grid minus busy intervals → open slot times
//! - [`source`] — Capabilities consumed from the external calendar
//! - [`registry`] — Lock-protected per-day slot map
//! - [`refresher`] — Rolling-window rebuild with atomic swap
//! - [`resolver`] — Open-slot computation with lazy hold reclamation
//! - [`service`] — The facade used by request handlers
//! - [`error`] — Error types

pub mod clock;
pub mod config;
pub mod error;
pub mod grid;
pub mod refresher;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod slot;
pub mod source;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{parse_date, parse_time_of_day, SlotConfig};
pub use error::{Result, SlotError};
pub use refresher::{CacheRefresher, RefreshSummary};
pub use registry::SlotRegistry;
pub use resolver::AvailabilityResolver;
pub use service::{BookingReceipt, SlotService};
pub use slot::{DaySchedule, Slot, SlotState, SlotView};
pub use source::{Attendee, BookingConfirmer, BusyInterval, BusySource, SourceError};
