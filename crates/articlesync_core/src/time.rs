use std::fmt;

use chrono::{DateTime, Datelike, FixedOffset, Local, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// RFC 3339 with seconds precision and a numeric offset (`+09:00`, never `Z`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// An instant paired with the UTC offset it was written in.
///
/// Equality and ordering compare instants only, so `2000-01-01T00:00:00+00:00`
/// equals `2000-01-01T09:00:00+09:00`. The offset is kept for rendering and
/// for the date segments of derived file paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<FixedOffset>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Local::now().fixed_offset())
    }

    pub fn parse(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        DateTime::parse_from_rfc3339(trimmed)
            .map(Self)
            .map_err(|source| Error::InvalidTimestamp {
                value: trimmed.to_string(),
                source,
            })
    }

    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// `(YYYY, MM, DD)` in the timestamp's own offset.
    pub fn date_segments(&self) -> (String, String, String) {
        (
            format!("{:04}", self.0.year()),
            format!("{:02}", self.0.month()),
            format!("{:02}", self.0.day()),
        )
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self(DateTime::<Utc>::default().fixed_offset())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Timestamp {
    fn from(value: DateTime<Tz>) -> Self {
        Self(value.fixed_offset())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
