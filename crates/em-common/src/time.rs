//! Fixed-offset timestamps.
//!
//! Every recorded event carries a timestamp in IST (UTC+05:30), independent
//! of the host time zone, so records stay comparable across deployments.
//! Timestamps are truncated to microseconds, the resolution of the stored
//! columns, so a value read back compares equal to the value written.

use chrono::{DateTime, FixedOffset, SecondsFormat, SubsecRound, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Offset of IST from UTC, in seconds.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Time zone string used in Arrow timestamp columns.
pub const IST_TZ: &str = "+05:30";

/// The IST offset.
pub const IST: FixedOffset = match FixedOffset::east_opt(IST_OFFSET_SECS) {
    Some(offset) => offset,
    None => panic!("IST offset out of range"),
};

/// A timestamp pinned to the IST offset at microsecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct IstTimestamp(DateTime<FixedOffset>);

impl IstTimestamp {
    /// Current wall-clock time in IST.
    pub fn now() -> Self {
        Self::from_datetime(&Utc::now())
    }

    /// Convert any zoned timestamp to IST.
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        IstTimestamp(dt.with_timezone(&IST).trunc_subsecs(6))
    }

    /// Build from microseconds since the Unix epoch.
    pub fn from_micros(micros: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_micros(micros).map(|dt| Self::from_datetime(&dt))
    }

    /// Parse an RFC 3339 string (any offset) and convert to IST.
    pub fn parse_rfc3339(s: &str) -> Result<Self, chrono::ParseError> {
        DateTime::parse_from_rfc3339(s).map(|dt| Self::from_datetime(&dt))
    }

    /// Microseconds since the Unix epoch.
    pub fn timestamp_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }

    /// The underlying zoned timestamp.
    pub fn as_datetime(&self) -> &DateTime<FixedOffset> {
        &self.0
    }

    /// The offset, always [`IST`].
    pub fn offset(&self) -> FixedOffset {
        *self.0.offset()
    }

    /// RFC 3339 with microseconds and explicit offset.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, false)
    }
}

impl From<DateTime<Utc>> for IstTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(&dt)
    }
}

impl From<DateTime<FixedOffset>> for IstTimestamp {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::from_datetime(&dt)
    }
}

impl fmt::Display for IstTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for IstTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let dt = DateTime::<FixedOffset>::deserialize(deserializer)?;
        Ok(Self::from_datetime(&dt))
    }
}
