//! Open-slot computation for a single date.
//!
//! Reading a day is also where lapsed holds are reclaimed: every call to
//! [`AvailabilityResolver::resolve_open_slots`] turns expired holds on that date
//! back into `Available` in the shared registry before filtering.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::clock::Clock;
use crate::config::SlotConfig;
use crate::error::Result;
use crate::refresher::CacheRefresher;
use crate::registry::SlotRegistry;

pub struct AvailabilityResolver {
    registry: Arc<SlotRegistry>,
    refresher: Arc<CacheRefresher>,
    clock: Arc<dyn Clock>,
    config: Arc<SlotConfig>,
}

impl AvailabilityResolver {
    pub fn new(
        registry: Arc<SlotRegistry>,
        refresher: Arc<CacheRefresher>,
        clock: Arc<dyn Clock>,
        config: Arc<SlotConfig>,
    ) -> Self {
        Self {
            registry,
            refresher,
            clock,
            config,
        }
    }

    /// Available slot times on `date`, ascending.
    ///
    /// Rebuilds the window first if `date` is not cached; returns an empty list
    /// if it is still absent afterwards. On today's date, slots starting at or
    /// before `now + lead_time` are left out.
    ///
    /// # Errors
    /// Returns `SlotError::RefreshFailed` if the cold-cache rebuild fails.
    pub async fn resolve_open_slots(&self, date: NaiveDate) -> Result<Vec<NaiveTime>> {
        self.refresher.refresh_if_missing(date).await?;
        let now = self.clock.now();
        let cutoff = self.cutoff(date, now);
        Ok(self
            .registry
            .open_slots(date, now, cutoff)
            .unwrap_or_default())
    }

    /// Local instant a slot on `date` must start after, if any.
    pub fn cutoff(&self, date: NaiveDate, now: DateTime<Utc>) -> Option<NaiveDateTime> {
        (date == self.config.today(now))
            .then(|| self.config.local_now(now) + self.config.lead_time())
    }

    /// Whether a slot falls inside the same-day lead-time buffer.
    pub fn within_lead_time(&self, date: NaiveDate, time: NaiveTime, now: DateTime<Utc>) -> bool {
        self.cutoff(date, now)
            .is_some_and(|cutoff| date.and_time(time) <= cutoff)
    }
}
