//! The facade used by request handlers.
//!
//! `SlotService` wires one registry, refresher and resolver together around a
//! shared config and clock, validates dates against the booking policy, and
//! exposes the query/mutation operations plus the composite booking flow.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::SlotConfig;
use crate::error::{Result, SlotError};
use crate::refresher::{CacheRefresher, RefreshSummary};
use crate::registry::SlotRegistry;
use crate::resolver::AvailabilityResolver;
use crate::slot::{SlotState, SlotView};
use crate::source::{Attendee, BookingConfirmer, BusySource};

/// A completed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingReceipt {
    pub confirmation_id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

pub struct SlotService {
    config: Arc<SlotConfig>,
    clock: Arc<dyn Clock>,
    registry: Arc<SlotRegistry>,
    refresher: Arc<CacheRefresher>,
    resolver: AvailabilityResolver,
}

impl SlotService {
    /// Build a service with an empty cache.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidConfig` if `config` fails validation.
    pub fn new(
        config: SlotConfig,
        source: Arc<dyn BusySource>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let registry = Arc::new(SlotRegistry::new());
        let refresher = Arc::new(CacheRefresher::new(
            Arc::clone(&registry),
            source,
            Arc::clone(&clock),
            Arc::clone(&config),
        ));
        let resolver = AvailabilityResolver::new(
            Arc::clone(&registry),
            Arc::clone(&refresher),
            Arc::clone(&clock),
            Arc::clone(&config),
        );
        Ok(Self {
            config,
            clock,
            registry,
            refresher,
            resolver,
        })
    }

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<SlotRegistry> {
        &self.registry
    }

    /// Local calendar date right now.
    pub fn today(&self) -> NaiveDate {
        self.config.today(self.clock.now())
    }

    /// # Errors
    /// Returns `SlotError::InvalidDate` if `date` is past, beyond the window,
    /// or on a closed weekday.
    pub fn check_date(&self, date: NaiveDate) -> Result<()> {
        self.config.check_bookable(date, self.today())
    }

    /// Open slot times on `date`. Dates outside the booking policy yield an
    /// empty list without touching the external calendar.
    ///
    /// # Errors
    /// Returns `SlotError::RefreshFailed` if a cold-cache rebuild fails.
    pub async fn get_open_slots(&self, date: NaiveDate) -> Result<Vec<NaiveTime>> {
        if self.check_date(date).is_err() {
            return Ok(Vec::new());
        }
        self.resolver.resolve_open_slots(date).await
    }

    /// Place a hold on a slot. Returns the hold expiry.
    ///
    /// # Errors
    /// `InvalidDate` for dates outside the policy; `SlotUnavailable` if the slot
    /// is booked, already held, not offered, or inside today's lead-time buffer;
    /// `RefreshFailed` if a cold-cache rebuild fails.
    pub async fn hold_slot(&self, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>> {
        self.check_date(date)?;
        self.refresher.refresh_if_missing(date).await?;
        let now = self.clock.now();
        if self.resolver.within_lead_time(date, time, now) {
            return Err(SlotError::SlotUnavailable { date, time });
        }
        self.registry
            .transition_to_blocked(date, time, now, self.config.hold_duration())
    }

    /// Record a booking the caller has already confirmed externally.
    ///
    /// Any slot in the day's schedule is accepted, including held slots and
    /// slots already inside the same-day lead time, since the external event
    /// exists by now. Confirming a booked slot again succeeds without change.
    /// A cold cache is rebuilt before the slot is judged.
    ///
    /// # Errors
    /// `InvalidDate` for dates outside the policy; `SlotUnavailable` if the slot
    /// is not in the day's schedule; `RefreshFailed` if a cold-cache rebuild
    /// fails.
    pub async fn confirm_slot(&self, date: NaiveDate, time: NaiveTime) -> Result<()> {
        self.check_date(date)?;
        self.refresher.refresh_if_missing(date).await?;
        let now = self.clock.now();
        match self.registry.slot_state(date, time, now) {
            Some(SlotState::Booked) => Ok(()),
            Some(SlotState::Blocked) => self.registry.transition_to_booked(date, time),
            Some(SlotState::Available) => self.registry.transition_to_booked(date, time),
            _ => Err(SlotError::SlotUnavailable { date, time }),
        }
    }

    /// Drop a hold after a downstream failure. Booked slots are not affected.
    pub fn release_slot(&self, date: NaiveDate, time: NaiveTime) {
        self.registry.transition_to_available(date, time);
    }

    /// Hold, confirm externally, then record the booking.
    ///
    /// A slot that is already held is used as is; otherwise a hold is taken
    /// first. If the external confirmation fails, a hold taken by this call is
    /// released. A hold placed earlier is left to its owner.
    ///
    /// # Errors
    /// `InvalidAttendee` for an empty email; any error of
    /// [`hold_slot`](Self::hold_slot); `ExternalBookingFailed` when the
    /// confirmer fails.
    pub async fn book(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        attendee: &Attendee,
        confirmer: &dyn BookingConfirmer,
    ) -> Result<BookingReceipt> {
        if attendee.email.trim().is_empty() {
            return Err(SlotError::InvalidAttendee("missing email".to_string()));
        }
        self.check_date(date)?;
        self.refresher.refresh_if_missing(date).await?;

        let took_hold = !self.registry.is_held(date, time, self.clock.now());
        if took_hold {
            self.hold_slot(date, time).await?;
        }

        let Some(start) = self.config.local_to_utc(date, time) else {
            if took_hold {
                self.release_slot(date, time);
            }
            return Err(SlotError::SlotUnavailable { date, time });
        };
        let end = start + self.config.slot_width();

        let confirmation_id = match confirmer
            .confirm_external_booking(start, end, attendee)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                warn!(%date, time = %time.format("%H:%M"), error = %e, took_hold, "external booking failed");
                if took_hold {
                    self.release_slot(date, time);
                }
                return Err(SlotError::ExternalBookingFailed(e.to_string()));
            }
        };

        self.registry.transition_to_booked(date, time)?;
        info!(%date, time = %time.format("%H:%M"), %confirmation_id, "slot booked");

        Ok(BookingReceipt {
            confirmation_id,
            date,
            time,
            start,
            end,
        })
    }

    /// Force a full rebuild of the rolling window.
    ///
    /// # Errors
    /// Returns `SlotError::RefreshFailed` naming the failing date.
    pub async fn refresh(&self) -> Result<RefreshSummary> {
        self.refresher.refresh().await
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.registry.last_refreshed()
    }

    /// Dates currently cached.
    pub fn cached_dates(&self) -> Vec<NaiveDate> {
        self.registry.dates()
    }

    /// Every slot of a cached day, after reclaiming lapsed holds.
    pub fn day_snapshot(&self, date: NaiveDate) -> Option<Vec<SlotView>> {
        self.registry.snapshot(date, self.clock.now())
    }
}
