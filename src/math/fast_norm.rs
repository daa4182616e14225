//! Inverse of the standard normal CDF for uniform-to-normal mapping.
//!
//! Acklam's rational approximation, relative error below 1.2e-9 on `(0, 1)`.
//! The upper half is folded onto the lower one through `Φ⁻¹(p) = -Φ⁻¹(1 - p)`.

const CENTRAL_NUM: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_69e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const CENTRAL_DEN: [f64; 6] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
    1.0,
];
const TAIL_NUM: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const TAIL_DEN: [f64; 5] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
    1.0,
];

/// Below this probability the tail branch takes over.
const TAIL_SPLIT: f64 = 0.024_25;

#[inline]
fn horner(coeffs: &[f64], x: f64) -> f64 {
    coeffs[1..].iter().fold(coeffs[0], |acc, &c| acc.mul_add(x, c))
}

/// Lower-half quantile, `p` in `(0, 0.5]`.
#[inline]
fn lower_quantile(p: f64) -> f64 {
    if p < TAIL_SPLIT {
        let q = (-2.0 * p.ln()).sqrt();
        horner(&TAIL_NUM, q) / horner(&TAIL_DEN, q)
    } else {
        let q = p - 0.5;
        let r = q * q;
        q * horner(&CENTRAL_NUM, r) / horner(&CENTRAL_DEN, r)
    }
}

/// Standard normal quantile; `NaN` outside `[0, 1]`, infinite at the ends.
#[inline]
pub fn inverse_normal_cdf(p: f64) -> f64 {
    match p {
        p if !(0.0..=1.0).contains(&p) => f64::NAN,
        p if p == 0.0 => f64::NEG_INFINITY,
        p if p == 1.0 => f64::INFINITY,
        p if p <= 0.5 => lower_quantile(p),
        p => -lower_quantile(1.0 - p),
    }
}
