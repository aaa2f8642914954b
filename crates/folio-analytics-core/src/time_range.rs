use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AnalyticsError;

/// Look-back window selector shared by charts and comparisons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeRange {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[default]
    #[serde(rename = "ALL")]
    All,
}

impl TimeRange {
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::SixMonths => "6M",
            TimeRange::YearToDate => "YTD",
            TimeRange::OneYear => "1Y",
            TimeRange::All => "ALL",
        }
    }

    /// First date included in the window ending at `as_of`.
    ///
    /// Month arithmetic is calendar-based: the day is clamped to the end of a
    /// shorter month (31 March minus one month is 29 February in a leap year).
    pub fn start_date(&self, as_of: NaiveDate) -> NaiveDate {
        let months_back = match self {
            TimeRange::OneMonth => 1,
            TimeRange::ThreeMonths => 3,
            TimeRange::SixMonths => 6,
            TimeRange::OneYear => 12,
            TimeRange::YearToDate => {
                return NaiveDate::from_ymd_opt(as_of.year(), 1, 1).unwrap_or(as_of);
            }
            TimeRange::All => return NaiveDate::default(),
        };
        as_of
            .checked_sub_months(Months::new(months_back))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1M" => Ok(TimeRange::OneMonth),
            "3M" => Ok(TimeRange::ThreeMonths),
            "6M" => Ok(TimeRange::SixMonths),
            "YTD" => Ok(TimeRange::YearToDate),
            "1Y" => Ok(TimeRange::OneYear),
            "ALL" => Ok(TimeRange::All),
            other => Err(AnalyticsError::InvalidInput {
                field: "range".into(),
                reason: format!("Unknown time range '{other}'. Use: 1M, 3M, 6M, YTD, 1Y, ALL"),
            }),
        }
    }
}
