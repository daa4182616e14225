//! Module `market::curve`.
//!
//! Immutable knot containers for zero-rate and discrete-dividend schedules.
//!
//! Times are year fractions on a fixed 365-day basis. A curve is validated
//! once at construction (finite, non-negative, strictly increasing times)
//! and never mutated afterwards; shifted copies are new values.

use crate::core::PricingError;

/// Days per year used to convert day offsets to year fractions.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Converts a day offset to a year fraction.
#[inline]
pub fn year_fraction(days: i32) -> f64 {
    f64::from(days) / DAYS_PER_YEAR
}

/// One knot of a rate or dividend curve.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TermPoint {
    /// Year fraction from valuation.
    pub time: f64,
    /// Annualized zero rate or cash amount, depending on the curve role.
    pub value: f64,
}

impl TermPoint {
    #[inline]
    pub fn new(time: f64, value: f64) -> Self {
        Self { time, value }
    }
}

/// How values are read between knots of a zero-rate curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Linear in the zero rate, flat outside the knots.
    #[default]
    Linear,
    /// Linear in `r t` (log of the discount factor), flat rate outside the knots.
    LogLinearDiscount,
}

impl std::str::FromStr for Interpolation {
    type Err = PricingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "loglinear" | "log_linear" | "log_linear_discount" => Ok(Self::LogLinearDiscount),
            other => Err(PricingError::config(format!("unknown interpolation `{other}`"))),
        }
    }
}

#[derive(serde::Deserialize)]
struct DiscreteCurveData {
    points: Vec<TermPoint>,
    #[serde(default)]
    interpolation: Interpolation,
}

/// Ordered, validated sequence of [`TermPoint`]s.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "DiscreteCurveData")]
pub struct DiscreteCurve {
    points: Vec<TermPoint>,
    interpolation: Interpolation,
}

impl TryFrom<DiscreteCurveData> for DiscreteCurve {
    type Error = PricingError;

    fn try_from(data: DiscreteCurveData) -> Result<Self, Self::Error> {
        Self::new(data.points).map(|c| c.with_interpolation(data.interpolation))
    }
}

impl DiscreteCurve {
    /// Builds a curve, failing on non-finite values, negative times or
    /// non-increasing times.
    pub fn new(points: Vec<TermPoint>) -> Result<Self, PricingError> {
        let mut prev: Option<f64> = None;
        for p in &points {
            if !p.time.is_finite() || p.time < 0.0 {
                return Err(PricingError::curve(format!(
                    "knot time must be finite and >= 0, got {}",
                    p.time
                )));
            }
            if !p.value.is_finite() {
                return Err(PricingError::curve(format!(
                    "knot value at t={} is not finite",
                    p.time
                )));
            }
            if let Some(prev) = prev {
                if p.time <= prev {
                    return Err(PricingError::curve(format!(
                        "knot times must be strictly increasing ({} after {prev})",
                        p.time
                    )));
                }
            }
            prev = Some(p.time);
        }
        Ok(Self {
            points,
            interpolation: Interpolation::Linear,
        })
    }

    /// Curve with no knots.
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a curve from parallel day-offset and value arrays.
    pub fn from_days(days: &[i32], values: &[f64]) -> Result<Self, PricingError> {
        if days.len() != values.len() {
            return Err(PricingError::curve(format!(
                "day and value arrays differ in length ({} vs {})",
                days.len(),
                values.len()
            )));
        }
        Self::new(
            days.iter()
                .zip(values)
                .map(|(&d, &v)| TermPoint::new(year_fraction(d), v))
                .collect(),
        )
    }

    /// Single-knot curve; every read returns `value`.
    pub fn flat(value: f64) -> Result<Self, PricingError> {
        Self::new(vec![TermPoint::new(0.0, value)])
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    #[inline]
    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    #[inline]
    pub fn points(&self) -> &[TermPoint] {
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

    /// Knots with `t1 < time <= t2`.
    #[inline]
    pub fn points_between(&self, t1: f64, t2: f64) -> impl Iterator<Item = &TermPoint> {
        self.points
            .iter()
            .filter(move |p| p.time > t1 && p.time <= t2)
    }

    /// Interpolated value at `t`; zero on an empty curve.
    pub fn value_at(&self, t: f64) -> f64 {
        let pts = &self.points;
        let Some(first) = pts.first() else {
            return 0.0;
        };
        if t <= first.time {
            return first.value;
        }
        let last = pts[pts.len() - 1];
        if t >= last.time {
            return last.value;
        }

        // First knot strictly after t; exists because t < last.time.
        let idx = pts.partition_point(|p| p.time <= t);
        let left = pts[idx - 1];
        let right = pts[idx];
        let w = (t - left.time) / (right.time - left.time);
        match self.interpolation {
            Interpolation::Linear => left.value + w * (right.value - left.value),
            Interpolation::LogLinearDiscount => {
                let lt = left.value * left.time;
                let rt = right.value * right.time;
                (lt + w * (rt - lt)) / t
            }
        }
    }

    /// Copy with every knot moved by `dt`.
    ///
    /// Times that land below zero are floored at zero; when several knots
    /// collapse onto zero only the latest of them is kept.
    pub fn shifted(&self, dt: f64) -> Self {
        let mut points: Vec<TermPoint> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            let time = (p.time + dt).max(0.0);
            match points.last_mut() {
                Some(last) if last.time >= time => *last = TermPoint::new(time, p.value),
                _ => points.push(TermPoint::new(time, p.value)),
            }
        }
        Self {
            points,
            interpolation: self.interpolation,
        }
    }

    /// Copy without knots at or before `t`.
    pub fn after(&self, t: f64) -> Self {
        Self {
            points: self.points.iter().copied().filter(|p| p.time > t).collect(),
            interpolation: self.interpolation,
        }
    }
}
