//! Monte Carlo path pricer checks against closed forms and payoff bounds.

use approx::assert_abs_diff_eq;
use openferric_equity::core::{DiagKey, OptionType, PricingEngine};
use openferric_equity::engines::analytic::BlackScholesPricer;
use openferric_equity::engines::monte_carlo::PathPricer;
use openferric_equity::instruments::{OptionSpec, PathOption, PathPayoff, ResetPoint, ResetSchedule};
use openferric_equity::market::{DAYS_PER_YEAR, DiscreteCurve, MarketCurve};

const QUARTERS: [i32; 4] = [91, 182, 273, 365];

fn quarterly_cliquet(payoff: PathPayoff, vol: f64) -> PathOption {
    let mut points = vec![ResetPoint::fixed(0, 100.0)];
    points.extend(QUARTERS.iter().map(|&d| ResetPoint::future(d, vol)));
    let resets = ResetSchedule::new(points).expect("reset schedule");
    PathOption::new(100.0, 1.0, payoff, resets)
}

#[test]
fn uncapped_cliquet_sums_forward_returns() {
    let rate = 0.03;
    let curve = MarketCurve::flat(rate).expect("flat curve");
    let option = quarterly_cliquet(
        PathPayoff::Cliquet {
            strike: 1.0,
            local_cap: f64::INFINITY,
            local_floor: None,
            global_floor: f64::NEG_INFINITY,
        },
        0.2,
    );
    let result = PathPricer::new(20_000, 3).price(&option, &curve).expect("cliquet");

    let mut previous = 0;
    let mut expected = 0.0;
    for day in QUARTERS {
        expected += (rate * f64::from(day - previous) / DAYS_PER_YEAR).exp() - 1.0;
        previous = day;
    }
    expected *= (-rate).exp();

    let stderr = result.stderr.expect("stderr");
    assert!(
        (result.price - expected).abs() < 4.0 * stderr,
        "mc {} expected {expected} stderr {stderr}",
        result.price
    );
    assert_eq!(result.diagnostics.get_key(DiagKey::NumSteps), Some(4.0));
}

#[test]
fn capped_and_floored_cliquet_stays_in_its_payoff_range() {
    let curve = MarketCurve::flat(0.02).expect("flat curve");
    let option = quarterly_cliquet(
        PathPayoff::Cliquet {
            strike: 1.0,
            local_cap: 0.05,
            local_floor: Some(0.0),
            global_floor: 0.0,
        },
        0.25,
    );
    let result = PathPricer::new(8_000, 21).price(&option, &curve).expect("cliquet");
    let df = curve.discount_factor(1.0).expect("df");
    assert!(result.price > 0.0);
    assert!(result.price < df * 4.0 * 0.05);
}

#[test]
fn only_total_variance_to_the_last_reset_moves_a_vanilla() {
    let curve = MarketCurve::flat(0.04).expect("flat curve");
    let resets = ResetSchedule::new(vec![
        ResetPoint::future(91, 0.15),
        ResetPoint::future(182, 0.25),
        ResetPoint::future(365, 0.2),
    ])
    .expect("reset schedule");
    let option = PathOption::new(
        100.0,
        1.0,
        PathPayoff::Vanilla {
            option_type: OptionType::Put,
            strike: 95.0,
        },
        resets,
    );
    let mc = PathPricer::new(30_000, 8).price(&option, &curve).expect("path put");
    let bs = BlackScholesPricer::new()
        .price(&OptionSpec::european_put(100.0, 95.0, 1.0, 0.2), &curve)
        .expect("bs put");
    assert!((mc.price - bs.price).abs() < 4.0 * mc.stderr.expect("stderr"));
}

#[test]
fn cash_dividends_flow_through_the_forward_yield() {
    let curve = MarketCurve::flat(0.05)
        .expect("flat curve")
        .with_dividends(DiscreteCurve::from_days(&[120, 240], &[1.5, 1.5]).expect("dividends"));
    let resets = ResetSchedule::new(vec![ResetPoint::future(365, 0.3)]).expect("reset schedule");
    let option = PathOption::new(
        100.0,
        1.0,
        PathPayoff::Vanilla {
            option_type: OptionType::Call,
            strike: 100.0,
        },
        resets,
    );
    let mc = PathPricer::new(30_000, 12).price(&option, &curve).expect("path call");
    let bs = BlackScholesPricer::new()
        .price(&OptionSpec::european_call(100.0, 100.0, 1.0, 0.3), &curve)
        .expect("bs call");
    assert!((mc.price - bs.price).abs() < 4.0 * mc.stderr.expect("stderr"));
}

#[test]
fn runs_are_reproducible_for_a_seed() {
    let curve = MarketCurve::flat(0.01).expect("flat curve");
    let option = quarterly_cliquet(
        PathPayoff::Cliquet {
            strike: 1.0,
            local_cap: 0.04,
            local_floor: None,
            global_floor: 0.0,
        },
        0.2,
    );
    let pricer = PathPricer::new(10_000, 2024);
    let first = pricer.price(&option, &curve).expect("first run");
    let second = pricer.price(&option, &curve).expect("second run");
    assert_eq!(first.price.to_bits(), second.price.to_bits());
    assert_eq!(first.greeks, second.greeks);
    assert_eq!(first.greek_errors, second.greek_errors);
}

#[test]
fn antithetic_pairs_tighten_the_error() {
    let curve = MarketCurve::flat(0.03).expect("flat curve");
    let resets = ResetSchedule::new(vec![ResetPoint::future(365, 0.2)]).expect("reset schedule");
    let option = PathOption::new(
        100.0,
        1.0,
        PathPayoff::Vanilla {
            option_type: OptionType::Call,
            strike: 100.0,
        },
        resets,
    );
    let plain = PathPricer::new(10_000, 4)
        .with_antithetic(false)
        .price(&option, &curve)
        .expect("plain");
    let paired = PathPricer::new(10_000, 4)
        .with_antithetic(true)
        .price(&option, &curve)
        .expect("antithetic");
    assert!(paired.stderr.expect("stderr") < plain.stderr.expect("stderr"));
    assert_abs_diff_eq!(paired.price, plain.price, epsilon = 0.5);
}
