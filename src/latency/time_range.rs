use crate::error::GatewayError;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Analytics look-back window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    OneHour,
    #[default]
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::OneHour,
        TimeRange::OneDay,
        TimeRange::SevenDays,
        TimeRange::ThirtyDays,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::OneHour => "1h",
            TimeRange::OneDay => "24h",
            TimeRange::SevenDays => "7d",
            TimeRange::ThirtyDays => "30d",
        }
    }

    pub fn window_ms(&self) -> i64 {
        const HOUR_MS: i64 = 60 * 60 * 1000;
        match self {
            TimeRange::OneHour => HOUR_MS,
            TimeRange::OneDay => 24 * HOUR_MS,
            TimeRange::SevenDays => 7 * 24 * HOUR_MS,
            TimeRange::ThirtyDays => 30 * 24 * HOUR_MS,
        }
    }

    /// Start of the window ending at `now`
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::milliseconds(self.window_ms())
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeRange {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeRange::ALL
            .into_iter()
            .find(|range| range.as_str() == s)
            .ok_or_else(|| GatewayError::InvalidRequest {
                message: format!("Invalid timeRange: {}. Use 1h, 24h, 7d, or 30d", s),
            })
    }
}

impl Serialize for TimeRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
