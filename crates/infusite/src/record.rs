//! Catheter application records and the capped history that holds them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{self, Location};
use crate::error::{Error, Result};

/// Maximum number of records retained in a history.
pub const MAX_RECORDS: usize = 100;

/// One catheter application.
///
/// The serialized field names match the persisted blob format, so renaming a
/// field here is a storage migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique id, derived from the creation instant.
    pub id: String,

    /// Catalog id of the insertion site.
    pub location_id: String,

    /// When the catheter was applied.
    #[serde(rename = "date")]
    pub timestamp: DateTime<Utc>,

    /// Free-text note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    /// How long the catheter stayed in, in hours.
    #[serde(
        rename = "duration",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_hours: Option<f64>,
}

impl Record {
    /// Create a record for a catalog location applied at `timestamp`.
    ///
    /// The id is the creation instant in Unix milliseconds, independent of
    /// when the catheter was applied.
    #[must_use]
    pub fn new(location: &Location, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Utc::now().timestamp_millis().to_string(),
            location_id: location.id.to_string(),
            timestamp,
            notes: None,
            duration_hours: None,
        }
    }

    /// Attach a note. Surrounding whitespace is trimmed and a blank note is
    /// dropped.
    #[must_use]
    pub fn with_notes(mut self, notes: impl AsRef<str>) -> Self {
        let trimmed = notes.as_ref().trim();
        self.notes = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Attach the wear duration in hours.
    ///
    /// # Errors
    ///
    /// Returns an error if `hours` is negative or not finite.
    pub fn with_duration_hours(mut self, hours: f64) -> Result<Self> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(Error::invalid_record(format!(
                "duration must be a non-negative number of hours, got {hours}"
            )));
        }
        self.duration_hours = Some(hours);
        Ok(self)
    }

    /// Resolve the record's location in the catalog.
    #[must_use]
    pub fn location(&self) -> Option<&'static Location> {
        catalog::find(&self.location_id)
    }
}

/// Ordered records, oldest first, plus the id of the most recent location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "HistoryRepr")]
pub struct History {
    records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_location_id: Option<String>,
}

/// Wire shape of a history; the cached id is recomputed on load.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRepr {
    #[serde(default)]
    records: Vec<Record>,
    #[serde(default)]
    last_location_id: Option<String>,
}

impl From<HistoryRepr> for History {
    fn from(repr: HistoryRepr) -> Self {
        let history = Self::from_records(repr.records);
        if repr.last_location_id != history.last_location_id {
            warn!(
                "Stored last location {:?} disagrees with records, using {:?}",
                repr.last_location_id, history.last_location_id
            );
        }
        history
    }
}

impl History {
    /// An empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from records in chronological order.
    ///
    /// No cap is applied; use [`History::push`] for capped appends.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        let last_location_id = records.last().map(|r| r.location_id.clone());
        Self {
            records,
            last_location_id,
        }
    }

    /// Parse an exported snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if `text` is not a valid snapshot.
    pub fn from_snapshot(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to the pretty-printed snapshot format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Append a record, evicting the oldest entries beyond `max_records`.
    ///
    /// A record whose id is already taken gets the next free id. Returns how
    /// many records were evicted.
    ///
    /// # Errors
    ///
    /// Returns an error if the record is older than the latest one.
    pub fn push(&mut self, mut record: Record, max_records: usize) -> Result<usize> {
        if let Some(latest) = self.records.last() {
            if record.timestamp < latest.timestamp {
                return Err(Error::invalid_record(format!(
                    "application time {} is earlier than the last record ({})",
                    record.timestamp.to_rfc3339(),
                    latest.timestamp.to_rfc3339()
                )));
            }
        }

        while self.records.iter().any(|r| r.id == record.id) {
            record.id = next_id(&record.id);
        }

        self.last_location_id = Some(record.location_id.clone());
        self.records.push(record);

        let overflow = self.records.len().saturating_sub(max_records.max(1));
        if overflow > 0 {
            self.records.drain(..overflow);
        }
        Ok(overflow)
    }

    /// Records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Location id of the most recent record.
    #[must_use]
    pub fn last_location_id(&self) -> Option<&str> {
        self.last_location_id.as_deref()
    }

    /// The most recent record.
    #[must_use]
    pub fn last_record(&self) -> Option<&Record> {
        self.records.last()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Successor of a record id: numeric ids count up, anything else gets a suffix.
fn next_id(id: &str) -> String {
    id.parse::<i64>()
        .ok()
        .and_then(|n| n.checked_add(1))
        .map_or_else(|| format!("{id}-1"), |n| n.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn record(id: &str, hours: i64) -> Record {
        Record::new(catalog::find(id).unwrap(), at(hours))
    }

    #[test]
    fn test_record_new() {
        let ts = at(5);
        let before = Utc::now().timestamp_millis();
        let r = Record::new(catalog::default_location(), ts);
        // Id tracks creation, not the application time
        assert!(r.id.parse::<i64>().unwrap() >= before);
        assert_ne!(r.id, ts.timestamp_millis().to_string());
        assert_eq!(r.location_id, "abdomen_left");
        assert_eq!(r.timestamp, ts);
        assert!(r.notes.is_none());
        assert!(r.duration_hours.is_none());
    }

    #[test]
    fn test_with_notes_trims_and_drops_blank() {
        let r = record("leg_left", 0).with_notes("  itchy  ");
        assert_eq!(r.notes.as_deref(), Some("itchy"));

        let r = record("leg_left", 0).with_notes("   ");
        assert!(r.notes.is_none());
    }

    #[test]
    fn test_with_duration_hours() {
        let r = record("leg_left", 0).with_duration_hours(72.5).unwrap();
        assert_eq!(r.duration_hours, Some(72.5));

        assert!(record("leg_left", 0).with_duration_hours(-1.0).is_err());
        assert!(record("leg_left", 0).with_duration_hours(f64::NAN).is_err());
    }

    #[test]
    fn test_record_location() {
        assert_eq!(record("glute_left", 0).location().unwrap().id, "glute_left");

        let mut stale = record("glute_left", 0);
        stale.location_id = "shoulder".to_string();
        assert!(stale.location().is_none());
    }

    #[test]
    fn test_record_wire_format() {
        let r = record("leg_right", 0)
            .with_notes("ok")
            .with_duration_hours(48.0)
            .unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["locationId"], "leg_right");
        assert_eq!(json["date"], "2024-01-01T00:00:00Z");
        assert_eq!(json["notes"], "ok");
        assert_eq!(json["duration"], 48.0);

        let bare = serde_json::to_value(record("leg_right", 0)).unwrap();
        assert!(bare.get("notes").is_none());
        assert!(bare.get("duration").is_none());
    }

    #[test]
    fn test_record_parses_millisecond_dates() {
        let json = r#"{"id":"1","locationId":"leg_left","date":"2024-01-01T10:30:00.250Z"}"#;
        let r: Record = serde_json::from_str(json).unwrap();
        assert_eq!(r.timestamp.timestamp_millis() % 1000, 250);
    }

    #[test]
    fn test_empty_history_invariant() {
        let h = History::new();
        assert!(h.is_empty());
        assert!(h.last_location_id().is_none());
        assert!(h.last_record().is_none());
    }

    #[test]
    fn test_push_updates_last_location() {
        let mut h = History::new();
        h.push(record("leg_left", 0), MAX_RECORDS).unwrap();
        h.push(record("glute_right", 1), MAX_RECORDS).unwrap();
        assert_eq!(h.len(), 2);
        assert_eq!(h.last_location_id(), Some("glute_right"));
    }

    #[test]
    fn test_push_evicts_oldest() {
        let mut h = History::new();
        for i in 0..3 {
            assert_eq!(h.push(record("leg_left", i), 3).unwrap(), 0);
        }
        let evicted = h.push(record("lumbar_left", 3), 3).unwrap();
        assert_eq!(evicted, 1);
        assert_eq!(h.len(), 3);
        assert_eq!(h.records()[0].timestamp, at(1));
        assert_eq!(h.last_location_id(), Some("lumbar_left"));
    }

    #[test]
    fn test_push_rejects_out_of_order_record() {
        let mut h = History::new();
        h.push(record("leg_left", 96), MAX_RECORDS).unwrap();

        let err = h.push(record("lumbar_left", 0), MAX_RECORDS).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { .. }));
        assert_eq!(h.len(), 1);
        assert_eq!(h.last_location_id(), Some("leg_left"));

        // Same instant as the latest is still in order
        h.push(record("glute_right", 96), MAX_RECORDS).unwrap();
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_push_keeps_ids_unique() {
        let mut h = History::new();
        let mut first = record("leg_left", 0);
        first.id = "1704412800000".to_string();
        let mut second = record("glute_right", 0);
        second.id.clone_from(&first.id);
        let mut third = record("lumbar_left", 1);
        third.id.clone_from(&first.id);

        for r in [first, second, third] {
            h.push(r, MAX_RECORDS).unwrap();
        }

        let ids: Vec<_> = h.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["1704412800000", "1704412800001", "1704412800002"]);
    }

    #[test]
    fn test_next_id() {
        assert_eq!(next_id("41"), "42");
        assert_eq!(next_id("abc"), "abc-1");
        assert_eq!(next_id(&i64::MAX.to_string()), format!("{}-1", i64::MAX));
    }

    #[test]
    fn test_from_records_sets_last_location() {
        let h = History::from_records(vec![record("leg_left", 0), record("leg_right", 1)]);
        assert_eq!(h.last_location_id(), Some("leg_right"));
        assert!(History::from_records(Vec::new()).last_location_id().is_none());
    }

    #[test]
    fn test_snapshot_wire_format() {
        let h = History::from_records(vec![record("leg_left", 0)]);
        let json: serde_json::Value = serde_json::from_str(&h.to_snapshot().unwrap()).unwrap();
        assert_eq!(json["lastLocationId"], "leg_left");
        assert_eq!(json["records"].as_array().unwrap().len(), 1);

        let empty: serde_json::Value =
            serde_json::from_str(&History::new().to_snapshot().unwrap()).unwrap();
        assert!(empty.get("lastLocationId").is_none());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut h = History::new();
        h.push(record("leg_left", 0).with_notes("first"), MAX_RECORDS)
            .unwrap();
        h.push(
            record("glute_right", 70).with_duration_hours(70.0).unwrap(),
            MAX_RECORDS,
        )
        .unwrap();

        let parsed = History::from_snapshot(&h.to_snapshot().unwrap()).unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn test_parse_repairs_stale_last_location() {
        let text = r#"{
            "records": [{"id":"1","locationId":"leg_left","date":"2024-01-01T00:00:00Z"}],
            "lastLocationId": "abdomen_right"
        }"#;
        let h = History::from_snapshot(text).unwrap();
        assert_eq!(h.last_location_id(), Some("leg_left"));

        let h = History::from_snapshot(r#"{"records":[],"lastLocationId":"leg_left"}"#).unwrap();
        assert!(h.last_location_id().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(History::from_snapshot("not json").is_err());
        assert!(History::from_snapshot(r#"{"records":[{"id":1}]}"#).is_err());
    }
}
