//! Next-site suggestion and usage statistics.
//!
//! Everything here is a pure computation over an already-loaded slice of
//! records. The only outside input is the clock used for the recency window.

use std::collections::BTreeMap;

use chrono::Duration;
use serde::Serialize;
use tracing::{debug, trace};

use crate::catalog::{self, Location, LOCATION_COUNT};
use crate::clock::{Clock, SystemClock};
use crate::record::Record;

/// Default length of the recency window in days.
pub const DEFAULT_RECENCY_WINDOW_DAYS: u32 = 30;

/// Picks the next insertion site from the record history.
#[derive(Debug, Clone)]
pub struct SuggestionEngine<C = SystemClock> {
    clock: C,
    recency_window: Duration,
}

impl Default for SuggestionEngine<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionEngine<SystemClock> {
    /// An engine using the wall clock and a 30-day window.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> SuggestionEngine<C> {
    /// An engine reading "now" from `clock`.
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            recency_window: Duration::days(i64::from(DEFAULT_RECENCY_WINDOW_DAYS)),
        }
    }

    /// Override the recency window used for usage counts.
    #[must_use]
    pub fn recency_window(mut self, window: Duration) -> Self {
        self.recency_window = window;
        self
    }

    /// Suggest the next insertion site.
    ///
    /// `history` must be in chronological order, oldest first.
    #[must_use]
    pub fn suggest_next(&self, history: &[Record]) -> &'static Location {
        let Some(last_record) = history.last() else {
            debug!("No history, suggesting default location");
            return catalog::default_location();
        };

        let Some(last) = last_record.location() else {
            debug!(
                "Last record references unknown location '{}', falling back",
                last_record.location_id
            );
            return catalog::first();
        };

        let usage = self.recent_usage(history);

        let candidates = excluding(last);
        let candidates = avoid_repeated_side(candidates, history, last);
        let candidates = prefer_other_zone(candidates, last);
        let choice = least_used(&candidates, &usage).unwrap_or_else(catalog::first);

        debug!("Suggesting {} after {}", choice.id, last.id);
        choice
    }

    /// Per-location counts over records inside the recency window.
    fn recent_usage(&self, history: &[Record]) -> UsageStats {
        // A window reaching past the earliest representable instant covers
        // everything.
        let cutoff = self.clock.now().checked_sub_signed(self.recency_window);
        let recent = history
            .iter()
            .filter(|r| cutoff.map_or(true, |cutoff| r.timestamp >= cutoff));
        let usage = UsageStats::tally(recent);
        trace!(
            "Recency window since {:?} covers {} records",
            cutoff,
            usage.total()
        );
        usage
    }
}

/// Every catalog location except `last`.
fn excluding(last: &Location) -> Vec<&'static Location> {
    catalog::all().iter().filter(|l| l.id != last.id).collect()
}

/// Drop same-side candidates after two consecutive applications on that side.
///
/// Looks at the two most recent records of the full history, independent of
/// the recency window. Leaves the set untouched if the rule would empty it.
fn avoid_repeated_side(
    candidates: Vec<&'static Location>,
    history: &[Record],
    last: &Location,
) -> Vec<&'static Location> {
    let [.., previous, latest] = history else {
        return candidates;
    };

    let same_side = [previous, latest]
        .iter()
        .all(|r| r.location().is_some_and(|l| l.side == last.side));
    if !same_side {
        return candidates;
    }

    let narrowed: Vec<_> = candidates
        .iter()
        .copied()
        .filter(|l| l.side != last.side)
        .collect();
    if narrowed.is_empty() {
        trace!("Side avoidance would leave no candidates, skipping");
        return candidates;
    }
    trace!("Avoiding {} side: {} candidates", last.side, narrowed.len());
    narrowed
}

/// Keep only candidates in a different zone than `last`, if there are any.
fn prefer_other_zone(
    candidates: Vec<&'static Location>,
    last: &Location,
) -> Vec<&'static Location> {
    let narrowed: Vec<_> = candidates
        .iter()
        .copied()
        .filter(|l| l.zone != last.zone)
        .collect();
    if narrowed.is_empty() {
        return candidates;
    }
    trace!("Leaving {} zone: {} candidates", last.zone, narrowed.len());
    narrowed
}

/// The candidate with the lowest count; the earliest wins ties.
fn least_used(candidates: &[&'static Location], usage: &UsageStats) -> Option<&'static Location> {
    candidates
        .iter()
        .copied()
        .min_by_key(|l| usage.get(l.id).unwrap_or(0))
}

/// Per-location application counts.
///
/// Always carries a count for each of the catalog locations, in catalog
/// order. Records whose location id no longer resolves are counted in
/// [`UsageStats::unrecognized`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStats {
    counts: [usize; LOCATION_COUNT],
    unrecognized: usize,
}

impl UsageStats {
    fn tally<'a>(records: impl IntoIterator<Item = &'a Record>) -> Self {
        let mut stats = Self::default();
        for record in records {
            match catalog::position(&record.location_id) {
                Some(idx) => stats.counts[idx] += 1,
                None => stats.unrecognized += 1,
            }
        }
        stats
    }

    /// Count for a location id, `None` if it is not in the catalog.
    #[must_use]
    pub fn get(&self, location_id: &str) -> Option<usize> {
        catalog::position(location_id).map(|idx| self.counts[idx])
    }

    /// Locations and their counts in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static Location, usize)> + '_ {
        catalog::all().iter().zip(self.counts.iter().copied())
    }

    /// Sum of all catalog counts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Records whose location id is not in the catalog.
    #[must_use]
    pub fn unrecognized(&self) -> usize {
        self.unrecognized
    }

    /// The counts as a map keyed by location id.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<&'static str, usize> {
        self.iter().map(|(loc, count)| (loc.id, count)).collect()
    }
}

impl Serialize for UsageStats {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(LOCATION_COUNT))?;
        for (loc, count) in self.iter() {
            map.serialize_entry(loc.id, &count)?;
        }
        map.end()
    }
}

/// Lifetime usage count per location over the whole history.
#[must_use]
pub fn usage_stats(history: &[Record]) -> UsageStats {
    UsageStats::tally(history)
}

/// Mean time between consecutive applications, in hours.
///
/// Returns 0 with fewer than two records.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn average_interval_hours(history: &[Record]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }

    let total_ms: i64 = history
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_milliseconds())
        .sum();
    let intervals = (history.len() - 1) as f64;

    total_ms as f64 / 3_600_000.0 / intervals
}
