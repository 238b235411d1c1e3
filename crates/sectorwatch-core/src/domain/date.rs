use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, Weekday};

use crate::ValidationError;

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar date of a trading session (exchange-local session collapsed to its UTC date).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradingDate(Date);

impl TradingDate {
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    pub fn today_utc() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), ISO_DATE)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Date of a unix timestamp (seconds) in UTC.
    pub fn from_unix_timestamp(seconds: i64) -> Result<Self, ValidationError> {
        OffsetDateTime::from_unix_timestamp(seconds)
            .map(|value| Self(value.date()))
            .map_err(|_| ValidationError::InvalidDate {
                value: seconds.to_string(),
            })
    }

    /// Unix timestamp of midnight UTC on this date.
    pub fn unix_timestamp(self) -> i64 {
        self.0.midnight().assume_utc().unix_timestamp()
    }

    pub fn saturating_sub_days(self, days: u32) -> Self {
        Self(self.0.saturating_sub(Duration::days(i64::from(days))))
    }

    pub fn saturating_add_days(self, days: u32) -> Self {
        Self(self.0.saturating_add(Duration::days(i64::from(days))))
    }

    pub fn is_weekend(self) -> bool {
        matches!(self.0.weekday(), Weekday::Saturday | Weekday::Sunday)
    }

    pub fn into_inner(self) -> Date {
        self.0
    }

    pub fn format_iso(self) -> String {
        self.0
            .format(ISO_DATE)
            .unwrap_or_else(|_| String::from("<unformattable>"))
    }
}

impl Display for TradingDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for TradingDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for TradingDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

/// Half-open window `[start, end)` of calendar dates requested from a price source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: TradingDate,
    pub end: TradingDate,
}

impl DateRange {
    pub fn new(start: TradingDate, end: TradingDate) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvalidDateRange {
                start: start.format_iso(),
                end: end.format_iso(),
            });
        }
        Ok(Self { start, end })
    }

    /// Window ending at `end` and reaching back `days` calendar days.
    pub fn lookback(end: TradingDate, days: u32) -> Result<Self, ValidationError> {
        Self::new(end.saturating_sub_days(days), end)
    }

    pub fn contains(&self, date: TradingDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn days(&self) -> i64 {
        (self.end.0 - self.start.0).whole_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        let parsed = TradingDate::parse("2024-03-15").expect("must parse");
        assert_eq!(parsed.format_iso(), "2024-03-15");
    }

    #[test]
    fn rejects_non_iso_dates() {
        let err = TradingDate::parse("15/03/2024").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn converts_unix_timestamps_to_utc_dates() {
        // 2024-01-02T03:45:00Z
        let date = TradingDate::from_unix_timestamp(1_704_167_100).expect("valid timestamp");
        assert_eq!(date.format_iso(), "2024-01-02");
        assert_eq!(
            TradingDate::parse("2024-01-02").expect("date").unix_timestamp(),
            1_704_153_600
        );
    }

    #[test]
    fn lookback_window_spans_requested_days() {
        let end = TradingDate::parse("2024-04-01").expect("date");
        let range = DateRange::lookback(end, 90).expect("valid range");
        assert_eq!(range.start.format_iso(), "2024-01-02");
        assert_eq!(range.days(), 90);
        assert!(range.contains(range.start));
        assert!(!range.contains(end));
    }

    #[test]
    fn rejects_empty_range() {
        let day = TradingDate::parse("2024-04-01").expect("date");
        assert!(matches!(
            DateRange::new(day, day),
            Err(ValidationError::InvalidDateRange { .. })
        ));
    }
}
