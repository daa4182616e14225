//! Theta-scheme grid reference tests.
//!
//! The five-year cases (S=26.4, K=30, sigma=30%, r=5%, one 5.0 cash dividend on
//! day 83) were produced by an independent log-space Crank-Nicolson solver with
//! the same grid, boundary and dividend-shift conventions (200 nodes, 0.05y
//! steps, 8 standard deviations).

use approx::assert_abs_diff_eq;
use openferric_equity::core::{DiagKey, ExerciseStyle, PricingEngine, PricingError};
use openferric_equity::engines::analytic::BlackScholesPricer;
use openferric_equity::engines::pde::GridPricer;
use openferric_equity::instruments::OptionSpec;
use openferric_equity::market::{DiscreteCurve, MarketCurve, TermPoint};

const FIVE_YEARS: f64 = 1826.0 / 365.0;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dividend_curve() -> MarketCurve {
    MarketCurve::flat(0.05)
        .expect("flat curve")
        .with_dividends(DiscreteCurve::from_days(&[83], &[5.0]).expect("dividends"))
}

#[test]
fn five_year_options_with_a_cash_dividend() {
    let curve = dividend_curve();
    let pricer = GridPricer::new(200, 0.05);
    let cases = [
        (OptionSpec::european_put(26.4, 30.0, FIVE_YEARS, 0.3), 6.953_415_9, -0.418_517, 0.026_901),
        (OptionSpec::european_call(26.4, 30.0, FIVE_YEARS, 0.3), 5.065_280_3, 0.581_780, 0.026_900),
        (OptionSpec::american_call(26.4, 30.0, FIVE_YEARS, 0.3), 5.065_280_3, 0.581_780, 0.026_900),
        (OptionSpec::american_put(26.4, 30.0, FIVE_YEARS, 0.3), 9.355_585_2, -0.668_773, 0.052_277),
    ];

    for (spec, price, delta, gamma) in cases {
        let result = pricer.price(&spec, &curve).expect("grid pricing");
        let greeks = result.greeks.expect("grid greeks");
        assert_abs_diff_eq!(result.price, price, epsilon = 1e-4);
        assert_abs_diff_eq!(greeks.delta, delta, epsilon = 1e-4);
        assert_abs_diff_eq!(greeks.gamma, gamma, epsilon = 1e-4);
        assert_eq!(greeks.rho, 0.0);
        assert!(result.diagnostics.get_key(DiagKey::SorSweeps).expect("sweeps") > 0.0);
    }
}

#[test]
fn one_year_options_without_dividends() {
    let curve = MarketCurve::flat(0.03).expect("flat curve");
    let fine = GridPricer::new(800, 0.05);
    let coarse = GridPricer::new(100, 0.05);

    let put = OptionSpec::european_put(26.4, 30.0, 1.0, 0.2);
    assert_abs_diff_eq!(fine.price_value(&put, &curve).expect("put"), 3.825_993_7, epsilon = 1e-4);

    let call = OptionSpec::european_call(26.4, 30.0, 1.0, 0.2);
    let american_call = OptionSpec::american_call(26.4, 30.0, 1.0, 0.2);
    let c = coarse.price_value(&call, &curve).expect("call");
    let ac = coarse.price_value(&american_call, &curve).expect("american call");
    assert_abs_diff_eq!(c, 1.121_517_3, epsilon = 1e-4);
    assert_abs_diff_eq!(ac, c, epsilon = 1e-9);

    let american_put = OptionSpec::american_put(26.4, 30.0, 1.0, 0.2);
    assert_abs_diff_eq!(
        coarse.price_value(&american_put, &curve).expect("american put"),
        4.065_971_3,
        epsilon = 1e-4
    );
}

#[test]
fn grid_tracks_black_scholes_greeks() {
    let curve = MarketCurve::flat(0.05).expect("flat curve");
    let spec = OptionSpec::european_call(100.0, 100.0, 1.0, 0.2);
    let grid = GridPricer::new(200, 0.01).price(&spec, &curve).expect("grid");
    let bs = BlackScholesPricer::new().price(&spec, &curve).expect("bs");
    let (g, b) = (grid.greeks.expect("grid greeks"), bs.greeks.expect("bs greeks"));

    assert_abs_diff_eq!(grid.price, 10.458_97, epsilon = 1e-3);
    assert_abs_diff_eq!(grid.price, bs.price, epsilon = 0.01);
    assert_abs_diff_eq!(g.delta, b.delta, epsilon = 1e-3);
    assert_abs_diff_eq!(g.gamma, b.gamma, epsilon = 1e-4);
    assert_abs_diff_eq!(g.theta, b.theta, epsilon = 1e-4);
    assert_abs_diff_eq!(g.vega, b.vega, epsilon = 5e-3);
}

#[test]
fn theta_holds_up_when_expiry_is_not_a_whole_number_of_steps() {
    let curve = MarketCurve::flat(0.05).expect("flat curve");
    for (expiry, steps) in [(182.0 / 365.0, 50.0), (3.0, 300.0)] {
        let spec = OptionSpec::european_call(100.0, 100.0, expiry, 0.2);
        let grid = GridPricer::default().price(&spec, &curve).expect("grid");
        let bs = BlackScholesPricer::new().price(&spec, &curve).expect("bs");
        let (g, b) = (grid.greeks.expect("grid greeks"), bs.greeks.expect("bs greeks"));

        assert_eq!(grid.diagnostics.get_key(DiagKey::NumTimeSteps), Some(steps));
        assert_abs_diff_eq!(g.theta, b.theta, epsilon = 5e-4);
        assert_abs_diff_eq!(grid.price, bs.price, epsilon = 0.05);
    }
}

#[test]
fn dividend_on_expiry_lowers_the_terminal_spot() {
    let plain = MarketCurve::flat(0.05).expect("flat curve");
    let curve = plain
        .clone()
        .with_dividends(DiscreteCurve::from_days(&[365], &[3.0]).expect("dividends"));
    let pricer = GridPricer::new(200, 0.01);
    let bs = BlackScholesPricer::new();

    let call = OptionSpec::european_call(100.0, 100.0, 1.0, 0.2);
    let grid = pricer.price_value(&call, &curve).expect("grid call");
    let without = bs.price(&call, &plain).expect("bs call").price;
    let with_dividend = bs.price(&call, &curve).expect("bs call with dividend").price;
    assert!(with_dividend < without - 1.5);
    assert!(grid < without - 1.4);

    // Paying D on expiry turns the payoff into (S_T - D - K)+.
    let shifted_strike = bs
        .price(&OptionSpec::european_call(100.0, 103.0, 1.0, 0.2), &plain)
        .expect("bs shifted strike")
        .price;
    assert_abs_diff_eq!(grid, shifted_strike, epsilon = 0.03);

    let put = OptionSpec::european_put(100.0, 100.0, 1.0, 0.2);
    let shifted_put = bs
        .price(&OptionSpec::european_put(100.0, 103.0, 1.0, 0.2), &plain)
        .expect("bs shifted put")
        .price;
    assert_abs_diff_eq!(pricer.price_value(&put, &curve).expect("grid put"), shifted_put, epsilon = 0.03);
}

#[test]
fn dividend_next_to_a_step_boundary_is_stable() {
    let base = MarketCurve::flat(0.04).expect("flat curve");
    let at = |time: f64| {
        base.clone().with_dividends(
            DiscreteCurve::new(vec![TermPoint::new(time, 2.0)]).expect("dividends"),
        )
    };
    let pricer = GridPricer::new(200, 0.05);
    let spec = OptionSpec::american_put(100.0, 100.0, 1.0, 0.25);

    let on_step = pricer.price(&spec, &at(0.1)).expect("on step");
    let g0 = on_step.greeks.expect("greeks");
    for time in [0.100_000_1, 0.099_999_9] {
        let near = pricer.price(&spec, &at(time)).expect("near step");
        let g = near.greeks.expect("greeks");
        assert_abs_diff_eq!(near.price, on_step.price, epsilon = 1e-6);
        assert_abs_diff_eq!(g.delta, g0.delta, epsilon = 1e-6);
        assert_abs_diff_eq!(g.gamma, g0.gamma, epsilon = 1e-6);
        assert_abs_diff_eq!(g.theta, g0.theta, epsilon = 1e-6);
        assert_abs_diff_eq!(g.vega, g0.vega, epsilon = 1e-5);
        assert_eq!(near.diagnostics.get_key(DiagKey::NumTimeSteps), Some(20.0));
    }

    let european = spec.with_exercise(ExerciseStyle::European);
    let curve = at(0.100_000_1);
    let grid = pricer.price_value(&european, &curve).expect("european grid");
    let bs = BlackScholesPricer::new().price(&european, &curve).expect("bs").price;
    assert_abs_diff_eq!(grid, bs, epsilon = 0.05);
}

#[test]
fn implied_vol_recovers_the_pricing_vol() {
    let curve = MarketCurve::flat(0.03).expect("flat curve");
    let pricer = GridPricer::new(100, 0.05);
    let spec = OptionSpec::american_put(26.4, 26.4, 1.0, 0.2);
    let target = pricer.price_value(&spec, &curve).expect("target price");

    let vol = pricer
        .implied_vol(&spec.with_vol(0.3), &curve, target)
        .expect("implied vol");
    assert_abs_diff_eq!(vol, 0.2, epsilon = 1e-3);
}

#[test]
fn zero_vol_and_tiny_grids_are_rejected() {
    let curve = MarketCurve::flat(0.03).expect("flat curve");
    let spec = OptionSpec::european_put(100.0, 100.0, 1.0, 0.0);
    assert!(matches!(
        GridPricer::new(100, 0.05).price(&spec, &curve),
        Err(PricingError::InvalidInput(_))
    ));
    assert!(GridPricer::new(3, 0.05)
        .price(&spec.with_vol(0.2), &curve)
        .is_err());
}

#[test]
fn expired_option_is_intrinsic() {
    let curve = MarketCurve::flat(0.03).expect("flat curve");
    let spec = OptionSpec::american_put(90.0, 100.0, 0.0, 0.2);
    let result = GridPricer::default().price(&spec, &curve).expect("expired");
    assert_eq!(result.price, 10.0);
}

#[test]
fn sweep_cap_keeps_the_last_iterate_unless_strict() {
    init_logging();
    let curve = MarketCurve::flat(0.03).expect("flat curve");
    let spec = OptionSpec::american_put(100.0, 100.0, 1.0, 0.2);
    let capped = GridPricer {
        max_iterations: 1,
        ..GridPricer::new(100, 0.05)
    };

    let result = capped.price(&spec, &curve).expect("lenient grid");
    assert!(result.price.is_finite() && result.price > 0.0);
    assert!(matches!(
        capped.with_strict_convergence(true).price(&spec, &curve),
        Err(PricingError::NumericalNonConvergence(_))
    ));
}
