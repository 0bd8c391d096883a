//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable point in time, always UTC.
///
/// Serializes as an RFC 3339 / ISO-8601 string, which is the format the
/// activation claim fields use inside payment metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Returns the duration from another timestamp to this one.
    ///
    /// Negative if `other` is after `self`.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    pub fn plus(&self, duration: Duration) -> Self {
        Self(self.0 + duration)
    }

    pub fn minus(&self, duration: Duration) -> Self {
        Self(self.0 - duration)
    }

    /// Later of the two timestamps.
    pub fn max(self, other: Timestamp) -> Self {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> Timestamp {
        Timestamp::from_datetime(DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc))
    }

    #[test]
    fn serializes_as_iso8601_string() {
        let ts = at("2024-01-15T10:30:00Z");
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-01-15T10:30:00Z\"");
    }

    #[test]
    fn deserializes_from_offset_string() {
        let ts: Timestamp = serde_json::from_str("\"2024-01-15T13:30:00+03:00\"").unwrap();
        assert_eq!(ts, at("2024-01-15T10:30:00Z"));
    }

    #[test]
    fn duration_since_is_signed() {
        let earlier = at("2024-01-15T10:00:00Z");
        let later = at("2024-01-15T10:10:00Z");
        assert_eq!(later.duration_since(&earlier), Duration::minutes(10));
        assert_eq!(earlier.duration_since(&later), Duration::minutes(-10));
    }

    #[test]
    fn add_days_and_minus_move_in_opposite_directions() {
        let ts = at("2024-01-15T00:00:00Z");
        assert_eq!(ts.add_days(30), at("2024-02-14T00:00:00Z"));
        assert_eq!(ts.minus(Duration::hours(1)), at("2024-01-14T23:00:00Z"));
    }

    #[test]
    fn max_picks_later_timestamp() {
        let a = at("2024-01-01T00:00:00Z");
        let b = at("2024-06-01T00:00:00Z");
        assert_eq!(a.max(b), b);
        assert_eq!(b.max(a), b);
    }
}
