//! Hour-aligned timestamps.
//!
//! Every persisted timestamp is truncated to the start of its hour and
//! written as ISO-8601 without an offset (`2024-05-01T10:00:00`). Times are
//! taken in UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// How long an uptime entry is kept.
pub const RETENTION: TimeDelta = TimeDelta::hours(24);

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// An instant truncated to the start of its hour.
///
/// Construction always truncates, so two stamps are equal exactly when they
/// fall in the same hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "NaiveDateTime", into = "NaiveDateTime")]
pub struct HourStamp(NaiveDateTime);

impl HourStamp {
    /// The hour containing the current UTC time.
    pub fn now() -> Self {
        Self::from(now())
    }

    pub fn as_naive(&self) -> NaiveDateTime {
        self.0
    }
}

impl From<NaiveDateTime> for HourStamp {
    fn from(dt: NaiveDateTime) -> Self {
        let hour = TimeDelta::hours(i64::from(dt.hour()));
        HourStamp(dt.date().and_time(NaiveTime::MIN) + hour)
    }
}

impl From<HourStamp> for NaiveDateTime {
    fn from(stamp: HourStamp) -> Self {
        stamp.0
    }
}

impl fmt::Display for HourStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FORMAT))
    }
}

impl FromStr for HourStamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<NaiveDateTime>().map(HourStamp::from)
    }
}

/// Current UTC time without an offset.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Oldest instant still inside the retention window ending at `now`.
pub fn retention_cutoff(now: NaiveDateTime) -> NaiveDateTime {
    now - RETENTION
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        s.parse().unwrap()
    }

    #[test]
    fn truncates_to_hour() {
        let stamp = HourStamp::from(dt("2024-05-01T10:42:17.123456"));
        assert_eq!(stamp.as_naive(), dt("2024-05-01T10:00:00"));
    }

    #[test]
    fn same_hour_is_equal() {
        assert_eq!(
            HourStamp::from(dt("2024-05-01T10:00:00")),
            HourStamp::from(dt("2024-05-01T10:59:59.999"))
        );
        assert_ne!(
            HourStamp::from(dt("2024-05-01T10:59:59")),
            HourStamp::from(dt("2024-05-01T11:00:00"))
        );
    }

    #[test]
    fn display_has_no_offset_or_fraction() {
        let stamp = HourStamp::from(dt("2024-05-01T09:30:00"));
        assert_eq!(stamp.to_string(), "2024-05-01T09:00:00");
    }

    #[test]
    fn serde_uses_iso_format() {
        let stamp: HourStamp = "2024-05-01T23:00:00".parse().unwrap();
        let json = serde_json::to_string(&stamp).unwrap();
        assert_eq!(json, "\"2024-05-01T23:00:00\"");
    }

    #[test]
    fn deserializing_unaligned_value_truncates() {
        let stamp: HourStamp = serde_json::from_str("\"2024-05-01T23:15:00.5\"").unwrap();
        assert_eq!(stamp.to_string(), "2024-05-01T23:00:00");
    }

    #[test]
    fn cutoff_is_one_day_back() {
        assert_eq!(
            retention_cutoff(dt("2024-05-02T12:00:00")),
            dt("2024-05-01T12:00:00")
        );
    }
}
