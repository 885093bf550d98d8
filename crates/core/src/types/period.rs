//! Revenue period presets and the orders-by-date range.

use core::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a revenue period string is not one of the presets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid revenue period '{0}' (expected 7d, 30d or 90d)")]
pub struct ParsePeriodError(pub String);

/// Window of the revenue trend chart.
///
/// Serialized as its query-string form (`7d`, `30d`, `90d`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RevenuePeriod {
    #[serde(rename = "7d")]
    Last7Days,
    #[default]
    #[serde(rename = "30d")]
    Last30Days,
    #[serde(rename = "90d")]
    Last90Days,
}

impl RevenuePeriod {
    /// All presets in display order.
    pub const ALL: [Self; 3] = [Self::Last7Days, Self::Last30Days, Self::Last90Days];

    /// Query-string value for the `period` parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::Last90Days => "90d",
        }
    }

    /// Human-readable label for period selectors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Last7Days => "Last 7 days",
            Self::Last30Days => "Last 30 days",
            Self::Last90Days => "Last 90 days",
        }
    }

    /// Number of days covered by the period.
    #[must_use]
    pub const fn days(self) -> u32 {
        match self {
            Self::Last7Days => 7,
            Self::Last30Days => 30,
            Self::Last90Days => 90,
        }
    }
}

impl fmt::Display for RevenuePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RevenuePeriod {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "90d" => Ok(Self::Last90Days),
            other => Err(ParsePeriodError(other.to_string())),
        }
    }
}

/// Error returned when a date range ends before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("date range end {end} is before start {start}")]
pub struct DateRangeError {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive calendar range for the orders-by-date series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a new range.
    ///
    /// # Errors
    ///
    /// Returns `DateRangeError` if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError { start, end });
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Query parameters for the orders-by-date endpoint.
    #[must_use]
    pub fn query_pairs(&self) -> [(&'static str, String); 2] {
        [
            ("startDate", self.start.format("%Y-%m-%d").to_string()),
            ("endDate", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}

impl Default for DateRange {
    /// The fixed range the dashboard has always charted.
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
