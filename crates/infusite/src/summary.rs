//! Presentation helpers shared by the CLI commands.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::Location;
use crate::record::{History, Record};
use crate::suggestion::average_interval_hours;

/// Display name used for records whose location is no longer in the catalog.
pub const UNKNOWN_LOCATION_NAME: &str = "Unknown location";

/// How many of the newest records are flagged as recent in listings.
pub const RECENT_COUNT: usize = 3;

/// A record paired with its resolved location, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry<'a> {
    /// The underlying record.
    #[serde(flatten)]
    pub record: &'a Record,
    /// Display name of the location.
    pub location_name: &'static str,
    /// One of the most recent applications.
    pub recent: bool,
}

/// Records newest first, with display names.
pub fn entries_newest_first(history: &History) -> impl Iterator<Item = HistoryEntry<'_>> {
    history
        .records()
        .iter()
        .rev()
        .enumerate()
        .map(|(idx, record)| HistoryEntry {
            record,
            location_name: record
                .location()
                .map_or(UNKNOWN_LOCATION_NAME, |loc: &'static Location| {
                    loc.display_name
                }),
            recent: idx < RECENT_COUNT,
        })
}

/// Format a duration in hours as `"5h"` or `"2d 3h"`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_interval(hours: f64) -> String {
    if hours < 24.0 {
        return format!("{}h", hours.round() as i64);
    }
    let days = (hours / 24.0).floor() as i64;
    let remaining = (hours % 24.0).round() as i64;
    format!("{days}d {remaining}h")
}

/// Whole hours elapsed between `since` and `now`, as `"5h ago"` or
/// `"2d 3h ago"`.
#[must_use]
pub fn time_since(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - since).num_hours().max(0);
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d {}h ago", hours / 24, hours % 24)
}

/// A shareable text report: totals, average interval, then the snapshot.
#[must_use]
pub fn export_report(history: &History, snapshot: &str) -> String {
    format!(
        "Catheter site rotation data\n\n\
         Total records: {}\n\
         Average interval: {}\n\n\
         Full data (JSON):\n\n\
         {snapshot}",
        history.len(),
        format_interval(average_interval_hours(history.records())),
    )
}
