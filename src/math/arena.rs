//! Reusable pre-allocated buffers for pricing hot paths.

/// Call-scoped scratch buffers for the grid and path engines.
///
/// Buffers grow on demand and never shrink, so one arena can serve every
/// time step of a grid solve or every trial of a simulation chunk.
#[derive(Debug, Clone, Default)]
pub struct PricingArena {
    pub grid_values: Vec<f64>,
    pub grid_rhs: Vec<f64>,
    pub grid_scratch: Vec<f64>,
    pub path_levels: Vec<f64>,
    pub path_normals: Vec<f64>,
}

/// Mutable views into the grid buffers, all of the same length.
#[derive(Debug)]
pub struct GridBuffers<'a> {
    pub values: &'a mut [f64],
    pub rhs: &'a mut [f64],
    pub scratch: &'a mut [f64],
}

impl PricingArena {
    /// Creates an arena sized for `nodes` grid nodes and `resets` path resets.
    pub fn with_capacity(nodes: usize, resets: usize) -> Self {
        Self {
            grid_values: Vec::with_capacity(nodes),
            grid_rhs: Vec::with_capacity(nodes),
            grid_scratch: Vec::with_capacity(nodes),
            path_levels: Vec::with_capacity(resets),
            path_normals: Vec::with_capacity(resets),
        }
    }

    #[inline]
    fn ensure_len(buffer: &mut Vec<f64>, n: usize) {
        if buffer.len() < n {
            buffer.resize(n, 0.0);
        }
    }

    /// Grid buffers of length `n`.
    #[inline]
    pub fn grid(&mut self, n: usize) -> GridBuffers<'_> {
        Self::ensure_len(&mut self.grid_values, n);
        Self::ensure_len(&mut self.grid_rhs, n);
        Self::ensure_len(&mut self.grid_scratch, n);
        GridBuffers {
            values: &mut self.grid_values[..n],
            rhs: &mut self.grid_rhs[..n],
            scratch: &mut self.grid_scratch[..n],
        }
    }

    /// Reset-level buffer of length `n_resets` and normal-draw buffer of
    /// length `n_steps`.
    #[inline]
    pub fn path(&mut self, n_resets: usize, n_steps: usize) -> (&mut [f64], &mut [f64]) {
        Self::ensure_len(&mut self.path_levels, n_resets);
        Self::ensure_len(&mut self.path_normals, n_steps);
        (
            &mut self.path_levels[..n_resets],
            &mut self.path_normals[..n_steps],
        )
    }
}
