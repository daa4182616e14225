//! Numerical controls for each engine, loadable from TOML.
//!
//! Every section is optional in the file; missing keys fall back to the
//! defaults documented on each field.
//!
//! ```toml
//! [lattice]
//! steps = 400
//!
//! [grid]
//! nodes = 300
//! time_step = 0.005
//!
//! [path]
//! trials = 50000
//! seed = 7
//! rng = "std_rng"
//! ```

use std::path::Path;

use crate::core::PricingError;
use crate::math::fast_rng::RngKind;

/// Binomial lattice controls.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LatticeSettings {
    /// Tree depth, default 200.
    pub steps: usize,
    /// Replace the three nodes nearest the strike at step `N-1` with Black-Scholes values.
    pub smoothing: bool,
    /// Use the `[0, T]` forward rate on every step instead of per-step forwards.
    pub flat_rate: bool,
}

impl Default for LatticeSettings {
    fn default() -> Self {
        Self {
            steps: 200,
            smoothing: true,
            flat_rate: true,
        }
    }
}

/// Finite-difference grid controls.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Number of log-price nodes, default 200.
    pub nodes: usize,
    /// Nominal time step in years, default 0.01.
    pub time_step: f64,
    /// Grid half-width in standard deviations of `ln S` at expiry, default 8.
    pub width_in_std_devs: f64,
    /// Implicit weight of the theta scheme, 0.5 is Crank-Nicolson.
    pub theta: f64,
    /// SOR relaxation factor, 1.0 is plain Gauss-Seidel.
    pub relaxation: f64,
    /// SOR stopping threshold on `sqrt(sum of squared updates)`.
    pub tolerance: f64,
    /// SOR sweep cap per time step.
    pub max_iterations: usize,
    /// Fail with `NumericalNonConvergence` instead of keeping the last iterate.
    pub strict_convergence: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            nodes: 200,
            time_step: 0.01,
            width_in_std_devs: 8.0,
            theta: 0.5,
            relaxation: 1.0,
            tolerance: 1.0e-6,
            max_iterations: 10_000,
            strict_convergence: false,
        }
    }
}

/// Monte Carlo controls.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Number of trials, default 100 000.
    pub trials: usize,
    /// Base seed, default 3151.
    pub seed: u64,
    /// Price each draw together with its negation.
    pub antithetic: bool,
    /// Generator family.
    pub rng: RngKind,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            trials: 100_000,
            seed: 3151,
            antithetic: true,
            rng: RngKind::Xoshiro256PlusPlus,
        }
    }
}

/// Settings for all engines.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub lattice: LatticeSettings,
    pub grid: GridSettings,
    pub path: PathSettings,
}

impl EngineConfig {
    /// Parses a TOML document and validates the result.
    pub fn from_toml_str(raw: &str) -> Result<Self, PricingError> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| PricingError::config(format!("malformed engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PricingError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PricingError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Serializes back to TOML.
    pub fn to_toml_string(&self) -> Result<String, PricingError> {
        toml::to_string(self).map_err(|e| PricingError::config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        let mut errors = Vec::new();

        if self.lattice.steps < 3 {
            errors.push("lattice.steps must be at least 3".to_string());
        }
        if self.grid.nodes < 5 {
            errors.push("grid.nodes must be at least 5".to_string());
        }
        if !(self.grid.time_step > 0.0) {
            errors.push("grid.time_step must be positive".to_string());
        }
        if !(self.grid.width_in_std_devs > 0.0) {
            errors.push("grid.width_in_std_devs must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.grid.theta) {
            errors.push("grid.theta must lie in [0, 1]".to_string());
        }
        if !(self.grid.relaxation > 0.0 && self.grid.relaxation < 2.0) {
            errors.push("grid.relaxation must lie in (0, 2)".to_string());
        }
        if !(self.grid.tolerance > 0.0) || self.grid.max_iterations == 0 {
            errors.push("grid.tolerance and grid.max_iterations must be positive".to_string());
        }
        if self.path.trials == 0 {
            errors.push("path.trials must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PricingError::config(errors.join("; ")))
        }
    }
}
