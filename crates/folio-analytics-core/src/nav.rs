//! NAV snapshot series.
//!
//! A [`NavSeries`] is the ordered, one-point-per-date valuation history of a
//! single portfolio. Construction is the validation boundary: negative NAVs
//! are rejected here so the numerical routines downstream can assume clean,
//! date-sorted input.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::types::{Money, SnapshotRecord};
use crate::AnalyticsResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub nav: Money,
}

impl NavPoint {
    pub fn new(date: NaiveDate, nav: Money) -> Self {
        Self { date, nav }
    }
}

/// Ascending, date-unique sequence of NAV points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NavSeries {
    points: Vec<NavPoint>,
}

impl NavSeries {
    /// Build a series from points in any order.
    ///
    /// When two points share a date the later one in the input wins, which
    /// matches "an edit replaces the snapshot for that date".
    pub fn new(points: impl IntoIterator<Item = NavPoint>) -> AnalyticsResult<Self> {
        let mut series = NavSeries::default();
        for p in points {
            series.upsert(p)?;
        }
        Ok(series)
    }

    pub fn from_snapshots(snapshots: &[SnapshotRecord]) -> AnalyticsResult<Self> {
        Self::new(snapshots.iter().map(|s| NavPoint::new(s.date, s.nav)))
    }

    /// Insert a point, replacing any existing point on the same date.
    pub fn upsert(&mut self, point: NavPoint) -> AnalyticsResult<()> {
        if point.nav.is_sign_negative() && !point.nav.is_zero() {
            return Err(AnalyticsError::NegativeNav {
                context: format!("snapshot on {}", point.date),
                nav: point.nav,
            });
        }
        match self.points.binary_search_by_key(&point.date, |p| p.date) {
            Ok(idx) => self.points[idx] = point,
            Err(idx) => self.points.insert(idx, point),
        }
        Ok(())
    }

    pub fn points(&self) -> &[NavPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&NavPoint> {
        self.points.first()
    }

    pub fn latest(&self) -> Option<&NavPoint> {
        self.points.last()
    }

    /// NAV on `date`, or the most recent one before it.
    pub fn nav_at_or_before(&self, date: NaiveDate) -> Option<Money> {
        match self.points.binary_search_by_key(&date, |p| p.date) {
            Ok(idx) => Some(self.points[idx].nav),
            Err(0) => None,
            Err(idx) => Some(self.points[idx - 1].nav),
        }
    }

    /// Sub-series of points dated within `start..=end`.
    pub fn window(&self, start: NaiveDate, end: NaiveDate) -> NavSeries {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end).max(lo);
        NavSeries {
            points: self.points[lo..hi].to_vec(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NavPoint> {
        self.points.iter()
    }
}

impl<'de> Deserialize<'de> for NavSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let points = Vec::<NavPoint>::deserialize(deserializer)?;
        NavSeries::new(points).map_err(serde::de::Error::custom)
    }
}
