//! Seedable generators for the Monte Carlo engine.
//!
//! Every simulation chunk owns one generator seeded from the base seed and
//! its chunk index, so sequential and parallel runs draw identical numbers.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

use crate::core::PricingError;
use crate::math::fast_norm::inverse_normal_cdf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngKind {
    /// xoshiro256++ with inverse-CDF normals.
    #[default]
    Xoshiro256PlusPlus,
    /// `rand`'s `StdRng` with ziggurat normals from `rand_distr`.
    StdRng,
}

impl std::str::FromStr for RngKind {
    type Err = PricingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "xoshiro" | "xoshiro256plusplus" | "xoshiro256_plus_plus" => {
                Ok(Self::Xoshiro256PlusPlus)
            }
            "std" | "stdrng" | "std_rng" => Ok(Self::StdRng),
            other => Err(PricingError::config(format!("unknown rng `{other}`"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Xoshiro256PlusPlus {
    state: [u64; 4],
}

impl Xoshiro256PlusPlus {
    #[inline]
    pub fn seed_from_u64(seed: u64) -> Self {
        let mut sm = SplitMix64::new(seed);
        let mut state = [0_u64; 4];
        for item in &mut state {
            *item = sm.next_u64();
        }

        if state.iter().all(|&x| x == 0) {
            state[0] = 1;
        }

        Self { state }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.state[0].wrapping_add(self.state[3]))
            .rotate_left(23)
            .wrapping_add(self.state[0]);

        let t = self.state[1] << 17;

        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];

        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);

        result
    }

    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        unit_f64(self.next_u64())
    }
}

#[derive(Debug, Clone)]
pub enum FastRng {
    Xoshiro256PlusPlus(Xoshiro256PlusPlus),
    StdRng(StdRng),
}

impl FastRng {
    #[inline]
    pub fn from_seed(kind: RngKind, seed: u64) -> Self {
        match kind {
            RngKind::Xoshiro256PlusPlus => {
                Self::Xoshiro256PlusPlus(Xoshiro256PlusPlus::seed_from_u64(seed))
            }
            RngKind::StdRng => Self::StdRng(StdRng::seed_from_u64(seed)),
        }
    }

    #[inline]
    pub fn random_u64(&mut self) -> u64 {
        match self {
            Self::Xoshiro256PlusPlus(rng) => rng.next_u64(),
            Self::StdRng(rng) => rng.next_u64(),
        }
    }

    /// Uniform draw on `[0, 1)`.
    #[inline]
    pub fn random_f64(&mut self) -> f64 {
        unit_f64(self.random_u64())
    }

    /// Standard normal draw.
    #[inline]
    pub fn standard_normal(&mut self) -> f64 {
        match self {
            Self::Xoshiro256PlusPlus(rng) => inverse_normal_cdf(uniform_open01(rng.next_f64())),
            Self::StdRng(rng) => StandardNormal.sample(rng),
        }
    }
}

#[inline(always)]
fn unit_f64(bits: u64) -> f64 {
    (bits >> 11) as f64 * (1.0 / ((1_u64 << 53) as f64))
}

#[derive(Debug, Clone, Copy)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    #[inline]
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

/// Seed of simulation chunk `stream_index`.
#[inline]
pub fn stream_seed(base_seed: u64, stream_index: usize) -> u64 {
    base_seed.wrapping_add((stream_index as u64).wrapping_mul(7_919))
}

/// Maps [0, 1) → (ε, 1−ε) for safe inverse-CDF transformation.
#[inline(always)]
pub fn uniform_open01(u: f64) -> f64 {
    u.max(f64::EPSILON).min(1.0 - f64::EPSILON)
}
