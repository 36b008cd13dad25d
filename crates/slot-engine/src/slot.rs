//! Slot states and the per-day schedule.
//!
//! A slot is `Blocked` only while `now < hold_expiry`. Expired holds are not
//! swept by a timer; they are reclaimed to `Available` the next time the day
//! is read, or treated as available by any check that consults [`Slot::resolve`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    Available,
    /// Provisionally held while an external booking is being finalized.
    Blocked,
    /// Confirmed against the external calendar.
    Booked,
}

/// One bookable unit. The hold expiry is present only while `Blocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    state: SlotState,
    hold_expiry: Option<DateTime<Utc>>,
}

impl Slot {
    pub fn available() -> Self {
        Self {
            state: SlotState::Available,
            hold_expiry: None,
        }
    }

    /// True iff the slot is `Blocked` with an unexpired hold.
    pub fn is_held(&self, now: DateTime<Utc>) -> bool {
        self.state == SlotState::Blocked && self.hold_expiry.is_some_and(|expiry| now < expiry)
    }

    /// Effective state at `now`: a lapsed hold reads as `Available`.
    pub fn resolve(&self, now: DateTime<Utc>) -> SlotState {
        match self.state {
            SlotState::Blocked if !self.is_held(now) => SlotState::Available,
            state => state,
        }
    }

    /// Turn a lapsed hold back into `Available`. Returns whether anything changed.
    fn reclaim(&mut self, now: DateTime<Utc>) -> bool {
        if self.state == SlotState::Blocked && !self.is_held(now) {
            *self = Self::available();
            return true;
        }
        false
    }
}

/// Current state of one slot, as reported to operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotView {
    pub time: NaiveTime,
    pub state: SlotState,
    pub hold_expiry: Option<DateTime<Utc>>,
}

/// Time-ordered slots of a single calendar date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySchedule {
    slots: BTreeMap<NaiveTime, Slot>,
}

impl DaySchedule {
    /// Rebuild a day from the authoritative open set, carrying over state from
    /// `previous`.
    ///
    /// Times in `open` become `Available` unless `previous` has them booked or
    /// under an unexpired hold, in which case that state is kept. Lapsed holds
    /// come back as `Available`. Times not in `open` are dropped.
    pub fn merged(
        previous: Option<&DaySchedule>,
        open: &BTreeSet<NaiveTime>,
        now: DateTime<Utc>,
    ) -> Self {
        let slots = open
            .iter()
            .map(|time| {
                let carried = previous
                    .and_then(|day| day.slots.get(time))
                    .filter(|slot| match slot.state {
                        SlotState::Booked => true,
                        SlotState::Blocked => slot.is_held(now),
                        SlotState::Available => false,
                    })
                    .copied();
                (*time, carried.unwrap_or_else(Slot::available))
            })
            .collect();
        Self { slots }
    }

    pub fn get(&self, time: NaiveTime) -> Option<&Slot> {
        self.slots.get(&time)
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Reclaim every lapsed hold in place. Returns how many were reclaimed.
    pub fn reclaim_expired(&mut self, now: DateTime<Utc>) -> usize {
        self.slots
            .values_mut()
            .filter_map(|slot| slot.reclaim(now).then_some(()))
            .count()
    }

    /// Reclaim lapsed holds, then list the `Available` times in order.
    ///
    /// With a `cutoff`, a slot is listed only if its local start on `date` is
    /// strictly after the cutoff.
    pub fn open_slots(
        &mut self,
        date: NaiveDate,
        now: DateTime<Utc>,
        cutoff: Option<NaiveDateTime>,
    ) -> Vec<NaiveTime> {
        self.reclaim_expired(now);
        self.slots
            .iter()
            .filter(|(_, slot)| slot.state == SlotState::Available)
            .map(|(time, _)| *time)
            .filter(|time| cutoff.is_none_or(|c| date.and_time(*time) > c))
            .collect()
    }

    /// Place a hold until `until` if the slot resolves to `Available` at `now`.
    /// Returns `false` (and leaves the slot unchanged) otherwise.
    pub fn block(&mut self, time: NaiveTime, now: DateTime<Utc>, until: DateTime<Utc>) -> bool {
        match self.slots.get_mut(&time) {
            Some(slot) if slot.resolve(now) == SlotState::Available => {
                *slot = Slot {
                    state: SlotState::Blocked,
                    hold_expiry: Some(until),
                };
                true
            }
            _ => false,
        }
    }

    /// Mark the slot `Booked`, clearing any hold. Returns `false` if the slot
    /// does not exist.
    pub fn book(&mut self, time: NaiveTime) -> bool {
        match self.slots.get_mut(&time) {
            Some(slot) => {
                *slot = Slot {
                    state: SlotState::Booked,
                    hold_expiry: None,
                };
                true
            }
            None => false,
        }
    }

    /// Release a hold. Booked slots are left alone. Returns whether a hold was
    /// released.
    pub fn release(&mut self, time: NaiveTime) -> bool {
        match self.slots.get_mut(&time) {
            Some(slot) if slot.state == SlotState::Blocked => {
                *slot = Slot::available();
                true
            }
            _ => false,
        }
    }

    /// Reclaim lapsed holds, then report every slot.
    pub fn snapshot(&mut self, now: DateTime<Utc>) -> Vec<SlotView> {
        self.reclaim_expired(now);
        self.slots
            .iter()
            .map(|(time, slot)| SlotView {
                time: *time,
                state: slot.state,
                hold_expiry: slot.hold_expiry,
            })
            .collect()
    }
}
