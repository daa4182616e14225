use crate::core::{Payoff, PricingError};

/// Uniform grid in `x = ln S`.
#[derive(Debug, Clone)]
pub(super) struct LogGrid {
    pub x: Vec<f64>,
    pub lower: f64,
    pub dx: f64,
}

impl LogGrid {
    /// `nodes` points spanning `centre ± half_width`.
    pub fn new(centre: f64, half_width: f64, nodes: usize) -> Result<Self, PricingError> {
        if nodes < 5 {
            return Err(PricingError::input("grid needs at least 5 nodes"));
        }
        if !(half_width > 0.0) || !half_width.is_finite() {
            return Err(PricingError::input("grid width must be finite and > 0"));
        }
        let lower = centre - half_width;
        let dx = 2.0 * half_width / (nodes - 1) as f64;
        let x = (0..nodes).map(|i| lower + i as f64 * dx).collect();
        Ok(Self { x, lower, dx })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    #[inline]
    pub fn spot(&self, i: usize) -> f64 {
        self.x[i].exp()
    }

    /// Left node of the cell holding `x` and the weight of the right node.
    #[inline]
    pub fn bracket(&self, x: f64) -> (usize, f64) {
        let idx = (((x - self.lower) / self.dx).floor().max(0.0) as usize).min(self.len() - 2);
        (idx, (x - self.x[idx]) / self.dx)
    }

    /// Linear read of `values` at log-spot `x`.
    #[inline]
    pub fn interpolate(&self, values: &[f64], x: f64) -> f64 {
        let (idx, w) = self.bracket(x);
        values[idx] * (1.0 - w) + values[idx + 1] * w
    }
}

/// Closed-form edge values for one backward step.
#[derive(Debug, Clone, Copy)]
pub(super) struct Boundary {
    pub payoff: Payoff,
    pub american: bool,
    pub strike: f64,
    /// Time to expiry at the current grid time.
    pub tau: f64,
    /// Forward rate from the grid time to expiry.
    pub rate: f64,
    /// Dividends still to be paid before expiry, valued at the grid time.
    pub dividends: f64,
    pub zero_lower: bool,
    pub zero_upper: bool,
}

impl Boundary {
    #[inline]
    fn discount(&self) -> f64 {
        (-self.rate * self.tau).exp()
    }

    pub fn lower(&self, s: f64) -> f64 {
        if self.zero_lower {
            return 0.0;
        }
        match self.payoff {
            Payoff::Call | Payoff::DigitalCall => 0.0,
            Payoff::Put if self.american => self.strike - s,
            Payoff::Put => self.discount() * self.strike - (s - self.dividends).max(0.0),
            Payoff::DigitalPut | Payoff::UnitBond => self.discount(),
        }
    }

    pub fn upper(&self, s: f64) -> f64 {
        if self.zero_upper {
            return 0.0;
        }
        match self.payoff {
            Payoff::Call => {
                let forward_value = s - self.dividends - self.discount() * self.strike;
                if self.american {
                    forward_value.max(s - self.strike)
                } else {
                    forward_value
                }
            }
            Payoff::Put | Payoff::DigitalPut => 0.0,
            Payoff::DigitalCall | Payoff::UnitBond => self.discount(),
        }
    }
}

/// Tri-diagonal rows of the theta scheme. The coefficients of
/// `V_t + σ²/2 V_xx + (r - σ²/2) V_x - r V = 0` do not depend on `x`, so each
/// row is the same three numbers.
#[derive(Debug, Clone, Copy)]
pub(super) struct StepRows {
    pub sub_left: f64,
    pub diag_left: f64,
    pub super_left: f64,
    pub sub_right: f64,
    pub diag_right: f64,
    pub super_right: f64,
}

impl StepRows {
    pub fn new(theta: f64, vol: f64, rate: f64, dt: f64, dx: f64) -> Self {
        let n1 = dt / (dx * dx);
        let n2 = dt / dx;
        let a = 0.5 * vol * vol;
        let b = rate - 0.5 * vol * vol;
        let c = -rate;

        // Operator coefficients on (V[i-1], V[i], V[i+1]) over one step.
        let sub = n1 * a - 0.5 * n2 * b;
        let diag = -2.0 * n1 * a + dt * c;
        let sup = n1 * a + 0.5 * n2 * b;

        let explicit = 1.0 - theta;
        Self {
            sub_left: -theta * sub,
            diag_left: 1.0 - theta * diag,
            super_left: -theta * sup,
            sub_right: explicit * sub,
            diag_right: 1.0 + explicit * diag,
            super_right: explicit * sup,
        }
    }

    /// Explicit half of the step on interior nodes; edges are left at zero.
    pub fn explicit_rhs(&self, values: &[f64], rhs: &mut [f64]) {
        let n = values.len();
        rhs[0] = 0.0;
        rhs[n - 1] = 0.0;
        for i in 1..n - 1 {
            rhs[i] = self.sub_right * values[i - 1]
                + self.diag_right * values[i]
                + self.super_right * values[i + 1];
        }
    }
}

/// Outcome of one relaxation solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct SorOutcome {
    pub sweeps: usize,
    pub residual: f64,
    pub converged: bool,
}

/// Successive over-relaxation on the interior nodes of `values`, whose edge
/// entries already hold the boundary values. `floor`, when given, is applied
/// node by node after each update.
pub(super) fn sor_solve(
    rows: &StepRows,
    rhs: &[f64],
    values: &mut [f64],
    floor: Option<&[f64]>,
    relaxation: f64,
    tolerance: f64,
    max_iterations: usize,
) -> SorOutcome {
    let n = values.len();
    let mut sweeps = 0;
    let mut err = f64::INFINITY;
    while sweeps < max_iterations {
        err = 0.0;
        for i in 1..n - 1 {
            let gauss_seidel = (rhs[i]
                - rows.super_left * values[i + 1]
                - rows.sub_left * values[i - 1])
                / rows.diag_left;
            let mut updated = values[i] + relaxation * (gauss_seidel - values[i]);
            if let Some(floor) = floor {
                updated = updated.max(floor[i]);
            }
            let delta = updated - values[i];
            err += delta * delta;
            values[i] = updated;
        }
        sweeps += 1;
        if err.sqrt() <= tolerance {
            return SorOutcome {
                sweeps,
                residual: err.sqrt(),
                converged: true,
            };
        }
    }
    SorOutcome {
        sweeps,
        residual: err.sqrt(),
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn grid_brackets_and_interpolates_linearly() {
        let grid = LogGrid::new(0.0, 1.0, 5).unwrap();
        assert_relative_eq!(grid.dx, 0.5);
        let values: Vec<f64> = grid.x.iter().map(|x| 2.0 * x + 1.0).collect();
        assert_eq!(grid.bracket(0.1).0, 2);
        assert_relative_eq!(grid.interpolate(&values, 0.1), 1.2, epsilon = 1e-14);
        assert_relative_eq!(grid.interpolate(&values, 1.0), 3.0, epsilon = 1e-14);
    }

    #[test]
    fn sor_matches_direct_solution_of_small_system() {
        let rows = StepRows {
            sub_left: -1.0,
            diag_left: 4.0,
            super_left: -1.0,
            sub_right: 0.0,
            diag_right: 0.0,
            super_right: 0.0,
        };
        // Interior system [4 -1; -1 4] v = [5, 5] with zero edges: v = [5/3, 5/3].
        let rhs = [0.0, 5.0, 5.0, 0.0];
        let mut values = [0.0; 4];
        let out = sor_solve(&rows, &rhs, &mut values, None, 1.2, 1e-12, 1000);
        assert!(out.converged);
        assert_relative_eq!(values[1], 5.0 / 3.0, epsilon = 1e-10);
        assert_relative_eq!(values[2], 5.0 / 3.0, epsilon = 1e-10);

        let mut capped = [0.0; 4];
        let out = sor_solve(&rows, &rhs, &mut capped, None, 1.0, 1e-12, 2);
        assert!(!out.converged);
        assert_eq!(out.sweeps, 2);
    }

    #[test]
    fn fully_implicit_rows_carry_no_explicit_part() {
        let rows = StepRows::new(1.0, 0.2, 0.05, 0.01, 0.02);
        assert_eq!(rows.sub_right, 0.0);
        assert_eq!(rows.diag_right, 1.0);
        assert_eq!(rows.super_right, 0.0);
        assert!(rows.diag_left > 1.0 && rows.sub_left < 0.0 && rows.super_left < 0.0);

        // Crank-Nicolson splits the operator evenly between the two sides.
        let cn = StepRows::new(0.5, 0.2, 0.05, 0.01, 0.02);
        assert_relative_eq!(cn.sub_left, -cn.sub_right, epsilon = 1e-15);
        assert_relative_eq!(cn.diag_left - 1.0, 1.0 - cn.diag_right, epsilon = 1e-12);
        assert_relative_eq!(cn.super_left, -cn.super_right, epsilon = 1e-15);
    }

    #[test]
    fn put_boundaries_depend_on_exercise() {
        let mut bc = Boundary {
            payoff: Payoff::Put,
            american: false,
            strike: 100.0,
            tau: 1.0,
            rate: 0.05,
            dividends: 2.0,
            zero_lower: false,
            zero_upper: false,
        };
        assert_relative_eq!(bc.lower(1.0), 100.0 * (-0.05_f64).exp(), epsilon = 1e-12);
        assert_eq!(bc.upper(500.0), 0.0);
        bc.american = true;
        assert_eq!(bc.lower(1.0), 99.0);
        bc.zero_lower = true;
        assert_eq!(bc.lower(1.0), 0.0);

        bc.payoff = Payoff::UnitBond;
        assert_relative_eq!(bc.upper(500.0), (-0.05_f64).exp(), epsilon = 1e-15);
    }
}
