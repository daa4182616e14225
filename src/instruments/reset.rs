//! Averaging and ratchet observation schedules.
//!
//! A [`ResetSchedule`] lists observation days relative to valuation. Days at
//! or before zero are historical fixings whose `level` is known; later days
//! are future resets that engines project or simulate, each quoted with the
//! spot volatility to that date.

use crate::core::PricingError;
use crate::market::year_fraction;

/// One observation date.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResetPoint {
    /// Day offset from valuation; `<= 0` means already fixed.
    pub day: i32,
    /// Fixing level for historical resets, ignored for future ones.
    pub level: f64,
    /// Spot volatility from valuation to this reset.
    pub vol: f64,
}

impl ResetPoint {
    #[inline]
    pub fn new(day: i32, level: f64, vol: f64) -> Self {
        Self { day, level, vol }
    }

    /// Future reset with no fixing yet.
    #[inline]
    pub fn future(day: i32, vol: f64) -> Self {
        Self::new(day, 0.0, vol)
    }

    /// Historical reset with a known fixing.
    #[inline]
    pub fn fixed(day: i32, level: f64) -> Self {
        Self::new(day, level, 0.0)
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.day <= 0
    }

    /// Year fraction of the reset, negative for past fixings.
    #[inline]
    pub fn time(&self) -> f64 {
        year_fraction(self.day)
    }
}

#[derive(serde::Deserialize)]
struct ResetScheduleData {
    points: Vec<ResetPoint>,
}

/// Ordered reset dates with historical fixings first.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "ResetScheduleData")]
pub struct ResetSchedule {
    points: Vec<ResetPoint>,
}

impl TryFrom<ResetScheduleData> for ResetSchedule {
    type Error = PricingError;

    fn try_from(data: ResetScheduleData) -> Result<Self, Self::Error> {
        Self::new(data.points)
    }
}

impl ResetSchedule {
    /// Validates non-empty input, non-decreasing days, finite levels and
    /// non-negative vols.
    pub fn new(points: Vec<ResetPoint>) -> Result<Self, PricingError> {
        if points.is_empty() {
            return Err(PricingError::input("reset schedule cannot be empty"));
        }
        if points.windows(2).any(|w| w[1].day < w[0].day) {
            return Err(PricingError::input("reset days must be non-decreasing"));
        }
        for p in &points {
            if !p.level.is_finite() || !p.vol.is_finite() || p.vol < 0.0 {
                return Err(PricingError::input(format!(
                    "reset on day {} has invalid level {} or vol {}",
                    p.day, p.level, p.vol
                )));
            }
            if p.is_fixed() && p.level <= 0.0 {
                return Err(PricingError::input(format!(
                    "historical reset on day {} needs a positive fixing",
                    p.day
                )));
            }
        }
        Ok(Self { points })
    }

    /// Builds a schedule from parallel day, level and vol arrays.
    pub fn from_arrays(days: &[i32], levels: &[f64], vols: &[f64]) -> Result<Self, PricingError> {
        if days.len() != levels.len() || days.len() != vols.len() {
            return Err(PricingError::input(format!(
                "reset arrays differ in length ({}, {}, {})",
                days.len(),
                levels.len(),
                vols.len()
            )));
        }
        Self::new(
            days.iter()
                .zip(levels)
                .zip(vols)
                .map(|((&d, &l), &v)| ResetPoint::new(d, l, v))
                .collect(),
        )
    }

    #[inline]
    pub fn points(&self) -> &[ResetPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of historical fixings, which lead the schedule.
    #[inline]
    pub fn fixed_count(&self) -> usize {
        self.points.partition_point(ResetPoint::is_fixed)
    }

    #[inline]
    pub fn future_count(&self) -> usize {
        self.len() - self.fixed_count()
    }

    #[inline]
    pub fn fixed(&self) -> &[ResetPoint] {
        &self.points[..self.fixed_count()]
    }

    #[inline]
    pub fn future(&self) -> &[ResetPoint] {
        &self.points[self.fixed_count()..]
    }

    /// Year fractions of the future resets.
    pub fn future_times(&self) -> Vec<f64> {
        self.future().iter().map(ResetPoint::time).collect()
    }

    /// Spot vols of the future resets.
    pub fn future_vols(&self) -> Vec<f64> {
        self.future().iter().map(|p| p.vol).collect()
    }

    /// Sum of the historical fixings.
    pub fn fixed_sum(&self) -> f64 {
        self.fixed().iter().map(|p| p.level).sum()
    }

    /// Year fraction of the last reset.
    pub fn last_time(&self) -> f64 {
        self.points.last().map_or(0.0, ResetPoint::time)
    }
}
