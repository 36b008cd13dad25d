//! Rolling-window rebuild from the external calendar.
//!
//! A rebuild fetches busy intervals for every open date of the window, turns
//! them into open slot sets, and swaps the whole window into the registry in
//! one step. Any failed fetch aborts the rebuild and leaves the registry as it
//! was.
//!
//! Rebuilds are serialised by an async gate. Cold-path callers re-check the
//! registry after acquiring the gate, so callers that queued behind an
//! in-flight rebuild share its result instead of fetching again.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::SlotConfig;
use crate::error::{Result, SlotError};
use crate::grid;
use crate::registry::SlotRegistry;
use crate::source::BusySource;

/// Outcome of a successful rebuild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    /// Dates now cached.
    pub days: usize,
    /// Slots now cached across all dates (any state).
    pub slots: usize,
    pub refreshed_at: DateTime<Utc>,
}

pub struct CacheRefresher {
    registry: Arc<SlotRegistry>,
    source: Arc<dyn BusySource>,
    clock: Arc<dyn Clock>,
    config: Arc<SlotConfig>,
    gate: Mutex<()>,
}

impl CacheRefresher {
    pub fn new(
        registry: Arc<SlotRegistry>,
        source: Arc<dyn BusySource>,
        clock: Arc<dyn Clock>,
        config: Arc<SlotConfig>,
    ) -> Self {
        Self {
            registry,
            source,
            clock,
            config,
            gate: Mutex::new(()),
        }
    }

    /// Rebuild the whole window unconditionally.
    ///
    /// # Errors
    /// Returns `SlotError::RefreshFailed` naming the first date whose fetch
    /// failed. Nothing is committed in that case.
    pub async fn refresh(&self) -> Result<RefreshSummary> {
        let _guard = self.gate.lock().await;
        self.rebuild().await
    }

    /// Rebuild the window only if `date` is not cached. Returns whether this
    /// call performed the rebuild.
    ///
    /// # Errors
    /// Same as [`refresh`](Self::refresh).
    pub async fn refresh_if_missing(&self, date: NaiveDate) -> Result<bool> {
        if self.registry.has_day(date) {
            return Ok(false);
        }
        let _guard = self.gate.lock().await;
        if self.registry.has_day(date) {
            debug!(%date, "cache filled by a concurrent refresh");
            return Ok(false);
        }
        self.rebuild().await?;
        Ok(true)
    }

    async fn rebuild(&self) -> Result<RefreshSummary> {
        let today = self.config.today(self.clock.now());
        let dates = self.config.window_dates(today);
        info!(%today, days = dates.len(), "refreshing slot cache");

        let mut window: BTreeMap<NaiveDate, BTreeSet<_>> = BTreeMap::new();
        for date in dates {
            let Some((start, end)) = grid::day_window(&self.config, date) else {
                warn!(%date, "booking hours fall in a DST gap, caching the day as closed");
                window.insert(date, BTreeSet::new());
                continue;
            };
            let busy = self
                .source
                .fetch_busy_intervals(date, start, end)
                .await
                .map_err(|e| {
                    warn!(%date, error = %e, "busy interval fetch failed, refresh aborted");
                    SlotError::RefreshFailed {
                        date,
                        reason: e.to_string(),
                    }
                })?;
            window.insert(date, grid::open_slots(&self.config, date, &busy));
        }

        let days = window.len();
        let refreshed_at = self.clock.now();
        let slots = self.registry.replace_window(window, refreshed_at);
        info!(days, slots, "slot cache refreshed");

        Ok(RefreshSummary {
            days,
            slots,
            refreshed_at,
        })
    }
}
