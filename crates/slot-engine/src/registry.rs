//! The slot registry: one [`DaySchedule`] per date of the rolling window.
//!
//! A single coarse lock guards the whole map. Every operation takes the lock
//! once, so check-then-set transitions (hold placement in particular) are
//! atomic. The lock is never held across an `.await`; callers fetch external
//! data first and apply it here afterwards.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Result, SlotError};
use crate::slot::{DaySchedule, SlotState, SlotView};

#[derive(Debug, Default)]
struct RegistryState {
    days: BTreeMap<NaiveDate, DaySchedule>,
    last_refreshed: Option<DateTime<Utc>>,
}

/// Shared in-memory slot state. Construct one per calendar and hand the same
/// `Arc<SlotRegistry>` to the resolver and refresher.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    state: Mutex<RegistryState>,
}

impl SlotRegistry {
    /// An empty (cold) registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().days.is_empty()
    }

    pub fn has_day(&self, date: NaiveDate) -> bool {
        self.state.lock().days.contains_key(&date)
    }

    /// Dates currently cached, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.state.lock().days.keys().copied().collect()
    }

    /// When the last full window rebuild completed.
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.state.lock().last_refreshed
    }

    /// Replace one day's schedule from the authoritative open set, keeping
    /// bookings and unexpired holds on times that are still open.
    pub fn load_day(&self, date: NaiveDate, open: &BTreeSet<NaiveTime>, now: DateTime<Utc>) {
        let mut state = self.state.lock();
        let day = DaySchedule::merged(state.days.get(&date), open, now);
        state.days.insert(date, day);
    }

    /// Swap in a complete window in one critical section.
    ///
    /// Each day is merged against its previous schedule as in
    /// [`load_day`](Self::load_day); dates not in `window` are dropped. Returns
    /// the number of slots now cached.
    pub fn replace_window(
        &self,
        window: BTreeMap<NaiveDate, BTreeSet<NaiveTime>>,
        now: DateTime<Utc>,
    ) -> usize {
        let mut state = self.state.lock();
        let days: BTreeMap<NaiveDate, DaySchedule> = window
            .iter()
            .map(|(date, open)| (*date, DaySchedule::merged(state.days.get(date), open, now)))
            .collect();
        let total = days.values().map(DaySchedule::slot_count).sum();
        state.days = days;
        state.last_refreshed = Some(now);
        total
    }

    /// Hold a slot until `now + hold`.
    ///
    /// # Errors
    /// Returns `SlotError::SlotUnavailable` if the slot is booked, held by an
    /// unexpired hold, or not in the day's schedule.
    pub fn transition_to_blocked(
        &self,
        date: NaiveDate,
        time: NaiveTime,
        now: DateTime<Utc>,
        hold: Duration,
    ) -> Result<DateTime<Utc>> {
        let until = now + hold;
        let mut state = self.state.lock();
        let blocked = state
            .days
            .get_mut(&date)
            .is_some_and(|day| day.block(time, now, until));
        if !blocked {
            return Err(SlotError::SlotUnavailable { date, time });
        }
        debug!(%date, time = %time.format("%H:%M"), %until, "slot held");
        Ok(until)
    }

    /// Mark a slot booked, overriding any hold. Booking an already booked slot
    /// succeeds without change.
    ///
    /// # Errors
    /// Returns `SlotError::SlotUnavailable` if the slot is not in the schedule.
    pub fn transition_to_booked(&self, date: NaiveDate, time: NaiveTime) -> Result<()> {
        let mut state = self.state.lock();
        let booked = state.days.get_mut(&date).is_some_and(|day| day.book(time));
        if !booked {
            return Err(SlotError::SlotUnavailable { date, time });
        }
        debug!(%date, time = %time.format("%H:%M"), "slot booked");
        Ok(())
    }

    /// Release a hold. Returns whether a hold was released; booked and
    /// unknown slots are left as they are.
    pub fn transition_to_available(&self, date: NaiveDate, time: NaiveTime) -> bool {
        let mut state = self.state.lock();
        let released = state
            .days
            .get_mut(&date)
            .is_some_and(|day| day.release(time));
        if released {
            debug!(%date, time = %time.format("%H:%M"), "hold released");
        }
        released
    }

    /// True iff the slot is blocked by an unexpired hold.
    pub fn is_held(&self, date: NaiveDate, time: NaiveTime, now: DateTime<Utc>) -> bool {
        self.state
            .lock()
            .days
            .get(&date)
            .and_then(|day| day.get(time))
            .is_some_and(|slot| slot.is_held(now))
    }

    /// Effective state of a slot at `now`, or `None` if it is not cached.
    pub fn slot_state(&self, date: NaiveDate, time: NaiveTime, now: DateTime<Utc>) -> Option<SlotState> {
        self.state
            .lock()
            .days
            .get(&date)
            .and_then(|day| day.get(time))
            .map(|slot| slot.resolve(now))
    }

    /// Reclaim lapsed holds on `date`. Returns how many were reclaimed.
    pub fn reclaim_expired(&self, date: NaiveDate, now: DateTime<Utc>) -> usize {
        let reclaimed = self
            .state
            .lock()
            .days
            .get_mut(&date)
            .map_or(0, |day| day.reclaim_expired(now));
        if reclaimed > 0 {
            debug!(%date, reclaimed, "expired holds reclaimed");
        }
        reclaimed
    }

    /// Reclaim lapsed holds on `date` and list its available times, or `None`
    /// if the date is not cached. See [`DaySchedule::open_slots`] for `cutoff`.
    pub fn open_slots(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
        cutoff: Option<NaiveDateTime>,
    ) -> Option<Vec<NaiveTime>> {
        self.state
            .lock()
            .days
            .get_mut(&date)
            .map(|day| day.open_slots(date, now, cutoff))
    }

    /// Every slot of `date` after reclaiming lapsed holds.
    pub fn snapshot(&self, date: NaiveDate, now: DateTime<Utc>) -> Option<Vec<SlotView>> {
        self.state
            .lock()
            .days
            .get_mut(&date)
            .map(|day| day.snapshot(now))
    }
}
