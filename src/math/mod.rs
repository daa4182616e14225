//! Numerical kernels shared by the engines: normal distribution, piecewise
//! linear interpolation and a small dense solver.

pub mod arena;
pub mod fast_norm;
pub mod fast_rng;

use std::f64::consts::SQRT_2;

use statrs::function::erf::erfc;

use crate::core::PricingError;

#[derive(Debug, Clone, PartialEq)]
pub enum MathError {
    SingularMatrix,
    InvalidInput(&'static str),
}

impl From<MathError> for PricingError {
    fn from(err: MathError) -> Self {
        match err {
            MathError::SingularMatrix => PricingError::input("singular linear system"),
            MathError::InvalidInput(msg) => PricingError::input(msg),
        }
    }
}

pub fn normal_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF through the complementary error function.
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// Piecewise-linear read of `(xs, ys)` at `x`, flat outside `[xs[0], xs[n-1]]`.
///
/// `xs` must be non-decreasing; repeated abscissae take the later ordinate.
pub fn linear_interpolate(xs: &[f64], ys: &[f64], x: f64) -> Result<f64, MathError> {
    if xs.is_empty() || xs.len() != ys.len() {
        return Err(MathError::InvalidInput(
            "interpolation needs equal, non-empty abscissa and ordinate arrays",
        ));
    }
    let n = xs.len();
    if x <= xs[0] {
        return Ok(ys[0]);
    }
    if x >= xs[n - 1] {
        return Ok(ys[n - 1]);
    }
    let hi = xs.partition_point(|&xi| xi <= x);
    let lo = hi - 1;
    let w = (x - xs[lo]) / (xs[hi] - xs[lo]);
    Ok(ys[lo] + w * (ys[hi] - ys[lo]))
}

/// Solves `a x = b` by Gauss-Jordan elimination with full pivoting.
pub fn gauss_jordan<const N: usize>(
    mut a: [[f64; N]; N],
    mut b: [f64; N],
) -> Result<[f64; N], MathError> {
    let mut row_used = [false; N];
    let mut col_used = [false; N];
    let mut col_of_row = [0usize; N];

    for _ in 0..N {
        let mut pivot = 0.0;
        let (mut prow, mut pcol) = (0, 0);
        for r in (0..N).filter(|&r| !row_used[r]) {
            for c in (0..N).filter(|&c| !col_used[c]) {
                if a[r][c].abs() > pivot {
                    pivot = a[r][c].abs();
                    prow = r;
                    pcol = c;
                }
            }
        }
        if !(pivot > f64::MIN_POSITIVE) {
            return Err(MathError::SingularMatrix);
        }
        row_used[prow] = true;
        col_used[pcol] = true;
        col_of_row[prow] = pcol;

        let inv = 1.0 / a[prow][pcol];
        for v in a[prow].iter_mut() {
            *v *= inv;
        }
        b[prow] *= inv;

        let pivot_row = a[prow];
        for r in (0..N).filter(|&r| r != prow) {
            let factor = a[r][pcol];
            if factor != 0.0 {
                for (v, p) in a[r].iter_mut().zip(pivot_row.iter()) {
                    *v -= factor * p;
                }
                b[r] -= factor * b[prow];
            }
        }
    }

    let mut x = [0.0; N];
    for (r, &c) in col_of_row.iter().enumerate() {
        x[c] = b[r];
    }
    Ok(x)
}
