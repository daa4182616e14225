//! Streaming mean and standard error of simulated samples.

/// Running sum and sum of squares of one sampled quantity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RunningStat {
    count: usize,
    sum: f64,
    sum_sq: f64,
}

impl RunningStat {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, sample: f64) {
        self.count += 1;
        self.sum += sample;
        self.sum_sq += sample * sample;
    }

    /// Folds another accumulator into this one.
    #[inline]
    pub fn merge(&mut self, other: &Self) {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Unbiased sample variance, zero below two samples.
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        let n = self.count as f64;
        ((self.sum_sq - self.sum * self.sum / n) / (n - 1.0)).max(0.0)
    }

    /// Standard error of the mean.
    pub fn stderr(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.variance() / self.count as f64).sqrt()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_variance_and_stderr() {
        let mut stat = RunningStat::new();
        for x in [1.0, 2.0, 3.0, 4.0] {
            stat.push(x);
        }
        assert_eq!(stat.count(), 4);
        assert_relative_eq!(stat.mean(), 2.5);
        assert_relative_eq!(stat.variance(), 5.0 / 3.0, epsilon = 1e-14);
        assert_relative_eq!(stat.stderr(), (5.0 / 12.0_f64).sqrt(), epsilon = 1e-14);
    }

    #[test]
    fn merge_equals_single_pass() {
        let samples = [0.3, -1.2, 4.5, 2.2, 0.0, 7.1];
        let mut whole = RunningStat::new();
        samples.iter().for_each(|&x| whole.push(x));

        let mut left = RunningStat::new();
        let mut right = RunningStat::new();
        samples[..2].iter().for_each(|&x| left.push(x));
        samples[2..].iter().for_each(|&x| right.push(x));
        left.merge(&right);

        assert_eq!(left.count(), whole.count());
        assert_relative_eq!(left.mean(), whole.mean(), epsilon = 1e-14);
        assert_relative_eq!(left.variance(), whole.variance(), epsilon = 1e-12);
    }

    #[test]
    fn empty_and_single_sample_have_no_error() {
        let mut stat = RunningStat::new();
        assert_eq!(stat.mean(), 0.0);
        assert_eq!(stat.stderr(), 0.0);
        stat.push(3.0);
        assert_eq!(stat.stderr(), 0.0);
    }
}
