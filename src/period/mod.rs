//! Named retention time spans and their total order.
//!
//! Periods are the unit of the time-based retention policy and of plan
//! storage limits. Every period except [`Period::Forever`] maps to a fixed
//! duration; `Forever` has no duration and compares strictly greater than
//! everything else.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a period string is not one of the known names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown period: {0}")]
pub struct UnknownPeriodError(pub String);

/// A named retention span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    /// 24 hours.
    Day,
    /// 7 days.
    Week,
    /// 30 days.
    Month,
    /// 90 days.
    ThreeMonths,
    /// 180 days.
    SixMonths,
    /// 365 days.
    Year,
    /// 2 × 365 days.
    TwoYears,
    /// 3 × 365 days.
    ThreeYears,
    /// 4 × 365 days.
    FourYears,
    /// 5 × 365 days.
    FiveYears,
    /// No expiry; the maximum of the period order.
    Forever,
}

impl Period {
    /// Canonical wire name of the period.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "DAY",
            Period::Week => "WEEK",
            Period::Month => "MONTH",
            Period::ThreeMonths => "3_MONTH",
            Period::SixMonths => "6_MONTH",
            Period::Year => "YEAR",
            Period::TwoYears => "2_YEARS",
            Period::ThreeYears => "3_YEARS",
            Period::FourYears => "4_YEARS",
            Period::FiveYears => "5_YEARS",
            Period::Forever => "FOREVER",
        }
    }

    /// Fixed duration of the period, or `None` for [`Period::Forever`].
    pub fn duration(&self) -> Option<Duration> {
        let hours = match self {
            Period::Day => 24,
            Period::Week => 7 * 24,
            Period::Month => 30 * 24,
            Period::ThreeMonths => 90 * 24,
            Period::SixMonths => 180 * 24,
            Period::Year => 365 * 24,
            Period::TwoYears => 2 * 365 * 24,
            Period::ThreeYears => 3 * 365 * 24,
            Period::FourYears => 4 * 365 * 24,
            Period::FiveYears => 5 * 365 * 24,
            Period::Forever => return None,
        };
        Some(Duration::hours(hours))
    }
}

impl Ord for Period {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Period::Forever, Period::Forever) => Ordering::Equal,
            (Period::Forever, _) => Ordering::Greater,
            (_, Period::Forever) => Ordering::Less,
            // Neither side is Forever, so both durations exist.
            _ => self.duration().cmp(&other.duration()),
        }
    }
}

impl PartialOrd for Period {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = UnknownPeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAY" => Ok(Period::Day),
            "WEEK" => Ok(Period::Week),
            "MONTH" => Ok(Period::Month),
            "3_MONTH" => Ok(Period::ThreeMonths),
            "6_MONTH" => Ok(Period::SixMonths),
            "YEAR" => Ok(Period::Year),
            "2_YEARS" => Ok(Period::TwoYears),
            "3_YEARS" => Ok(Period::ThreeYears),
            "4_YEARS" => Ok(Period::FourYears),
            "5_YEARS" => Ok(Period::FiveYears),
            "FOREVER" => Ok(Period::Forever),
            other => Err(UnknownPeriodError(other.to_string())),
        }
    }
}

impl TryFrom<String> for Period {
    type Error = UnknownPeriodError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.as_str().to_string()
    }
}
