use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Resolution at which an event records and displays times.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimePrecision {
    Seconds,
    #[default]
    Tenths,
    Hundredths,
}

impl TimePrecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Tenths => "tenths",
            Self::Hundredths => "hundredths",
        }
    }

    /// Size of one precision step in milliseconds.
    pub fn unit_ms(&self) -> i64 {
        match self {
            Self::Seconds => 1000,
            Self::Tenths => 100,
            Self::Hundredths => 10,
        }
    }

    pub fn truncate(&self, timestamp: NaiveDateTime) -> NaiveDateTime {
        let unit_ns = (self.unit_ms() * 1_000_000) as u32;
        let nanos = timestamp.nanosecond();
        timestamp
            .with_nanosecond(nanos - nanos % unit_ns)
            .unwrap_or(timestamp)
    }

    /// Parses a punch timestamp and truncates it to this precision.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f]`, `YYYY-MM-DDTHH:MM:SS[.f]`
    /// or a bare `HH:MM:SS[.f]`, which is placed on `event_date`.
    pub fn parse_timestamp(&self, raw: &str, event_date: NaiveDate) -> Option<NaiveDateTime> {
        let raw = raw.trim();

        let parsed = DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.naive_local())
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").ok())
            .or_else(|| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok())
            .or_else(|| {
                NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
                    .ok()
                    .map(|time| event_date.and_time(time))
            })?;

        Some(self.truncate(parsed))
    }

    /// Formats an elapsed duration as `M:SS.f` or `H:MM:SS.f`.
    pub fn format_elapsed(&self, elapsed_ms: i64) -> String {
        let sign = if elapsed_ms < 0 { "-" } else { "" };
        let ms = elapsed_ms.abs();

        let hours = ms / 3_600_000;
        let minutes = (ms / 60_000) % 60;
        let seconds = (ms / 1000) % 60;
        let fraction = match self {
            Self::Seconds => String::new(),
            Self::Tenths => format!(".{}", (ms % 1000) / 100),
            Self::Hundredths => format!(".{:02}", (ms % 1000) / 10),
        };

        if hours > 0 {
            format!("{sign}{hours}:{minutes:02}:{seconds:02}{fraction}")
        } else {
            format!("{sign}{minutes}:{seconds:02}{fraction}")
        }
    }
}

impl fmt::Display for TimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimePrecision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "seconds" => Ok(Self::Seconds),
            "tenths" => Ok(Self::Tenths),
            "hundredths" => Ok(Self::Hundredths),
            other => Err(format!("unknown time precision '{other}'")),
        }
    }
}

impl TryFrom<String> for TimePrecision {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    #[test]
    fn test_parse_time_only_uses_event_date() {
        let ts = TimePrecision::Tenths
            .parse_timestamp("10:15:30.47", date())
            .unwrap();
        assert_eq!(ts.to_string(), "2025-06-14 10:15:30.400");
    }

    #[test]
    fn test_parse_full_and_rfc3339() {
        let a = TimePrecision::Hundredths
            .parse_timestamp("2025-06-14 09:00:01.239", date())
            .unwrap();
        assert_eq!(a.nanosecond(), 230_000_000);

        let b = TimePrecision::Seconds
            .parse_timestamp("2025-06-14T09:00:01.9+02:00", date())
            .unwrap();
        assert_eq!(b.to_string(), "2025-06-14 09:00:01");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TimePrecision::Tenths.parse_timestamp("soon", date()).is_none());
        assert!(TimePrecision::Tenths.parse_timestamp("25:00:00", date()).is_none());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(TimePrecision::Tenths.format_elapsed(118_300), "1:58.3");
        assert_eq!(TimePrecision::Hundredths.format_elapsed(5_070), "0:05.07");
        assert_eq!(TimePrecision::Seconds.format_elapsed(3_725_000), "1:02:05");
    }
}
