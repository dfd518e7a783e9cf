//! Date values as they come back from the backend.
//!
//! The journal tables mix three textual shapes for the same concept:
//!
//! ```text
//! 2020-01-15                    date columns (trips, countries)
//! 2019-05-03T12:00:00           naive timestamps written by the ingestion script
//! 2019-05-03T12:00:00+00:00     timestamptz columns as PostgREST renders them
//! ```
//!
//! [`JournalDate`] accepts all of them (plus the space-separated form Postgres
//! uses in text casts) and keeps the wall-clock value. Time zones are dropped:
//! every page shows calendar dates only.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JournalDate(NaiveDateTime);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised date value: {0:?}")]
pub struct DateParseError(pub String);

impl JournalDate {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    pub fn date(&self) -> NaiveDate {
        self.0.date()
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }
}

impl FromStr for JournalDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(dt.naive_local()));
        }
        // Postgres text form: `2019-05-03 12:00:00+00`
        for fmt in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
            if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
                return Ok(Self(dt.naive_local()));
            }
        }
        for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(Self(dt));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::from_date)
            .map_err(|_| DateParseError(s.to_string()))
    }
}

impl fmt::Display for JournalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

impl Serialize for JournalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for JournalDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> JournalDate {
        s.parse().unwrap()
    }

    #[test]
    fn plain_date() {
        let d = parse("2020-01-15");
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2020, 1, 15).unwrap());
    }

    #[test]
    fn naive_timestamp() {
        let d = parse("2019-05-03T12:30:00");
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2019, 5, 3).unwrap());
        assert_eq!(d.datetime().format("%H:%M").to_string(), "12:30");
    }

    #[test]
    fn naive_timestamp_with_fraction() {
        let d = parse("2019-05-03T12:30:00.123456");
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2019, 5, 3).unwrap());
    }

    #[test]
    fn rfc3339_keeps_wall_clock() {
        let d = parse("2019-05-03T23:30:00+02:00");
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2019, 5, 3).unwrap());
    }

    #[test]
    fn postgres_text_form() {
        let d = parse("2019-05-03 08:00:00+00");
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2019, 5, 3).unwrap());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!("last tuesday".parse::<JournalDate>().is_err());
        assert!("".parse::<JournalDate>().is_err());
    }

    #[test]
    fn deserializes_from_json_string() {
        let d: JournalDate = serde_json::from_str(r#""2021-07-01T00:00:00+00:00""#).unwrap();
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2021, 7, 1).unwrap());
    }

    #[test]
    fn optional_null_deserializes_to_none() {
        let d: Option<JournalDate> = serde_json::from_str("null").unwrap();
        assert!(d.is_none());
    }
}
