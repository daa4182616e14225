use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use openferric_equity::core::{OptionType, PricingEngine};
use openferric_equity::engines::analytic::{AsianMomentPricer, BlackScholesPricer};
use openferric_equity::engines::monte_carlo::PathPricer;
use openferric_equity::engines::pde::GridPricer;
use openferric_equity::engines::tree::LatticePricer;
use openferric_equity::instruments::{
    AsianOption, OptionSpec, PathOption, PathPayoff, ResetPoint, ResetSchedule,
};
use openferric_equity::market::MarketCurve;
use std::hint::black_box;

// Performance goals (guideline, measured on target hardware):
// - Black-Scholes European call: < 200 ns
// - Lattice American put (200 steps): < 1 ms
// - Grid American put (200 nodes, 100 steps): < 5 ms

fn benchmark_curve() -> MarketCurve {
    MarketCurve::from_days(
        &[30, 91, 182, 365, 730],
        &[0.040, 0.041, 0.043, 0.045, 0.047],
        &[60, 150, 240, 330],
        &[0.6, 0.6, 0.65, 0.65],
    )
    .expect("benchmark curve should be valid")
}

fn quarterly_resets() -> ResetSchedule {
    ResetSchedule::new(
        [91, 182, 273, 365]
            .iter()
            .map(|&d| ResetPoint::future(d, 0.22))
            .collect(),
    )
    .expect("benchmark resets should be valid")
}

fn bench_black_scholes_european(c: &mut Criterion) {
    let curve = benchmark_curve();
    let spec = OptionSpec::european_call(100.0, 100.0, 1.0, 0.2);
    let engine = BlackScholesPricer::new();

    c.bench_function("black_scholes_european_call", |b| {
        b.iter(|| {
            let px = engine
                .price(black_box(&spec), black_box(&curve))
                .expect("pricing should succeed")
                .price;
            black_box(px)
        })
    });
}

fn bench_asian_moment(c: &mut Criterion) {
    let curve = benchmark_curve();
    let option = AsianOption::new(OptionType::Call, 100.0, 100.0, 1.0, quarterly_resets());
    let engine = AsianMomentPricer::new();

    c.bench_function("asian_moment_call", |b| {
        b.iter(|| {
            let px = engine
                .price(black_box(&option), black_box(&curve))
                .expect("pricing should succeed")
                .price;
            black_box(px)
        })
    });
}

fn bench_lattice_steps(c: &mut Criterion) {
    let curve = benchmark_curve();
    let spec = OptionSpec::american_put(100.0, 100.0, 1.0, 0.2);
    let mut group = c.benchmark_group("lattice_american_put");

    for steps in [100_usize, 200, 500] {
        let engine = LatticePricer::new(steps);
        group.bench_with_input(BenchmarkId::from_parameter(steps), &steps, |b, _| {
            b.iter(|| {
                let px = engine
                    .price(black_box(&spec), black_box(&curve))
                    .expect("pricing should succeed")
                    .price;
                black_box(px)
            })
        });
    }

    group.finish();
}

fn bench_grid_nodes(c: &mut Criterion) {
    let curve = benchmark_curve();
    let spec = OptionSpec::american_put(100.0, 100.0, 1.0, 0.2);
    let mut group = c.benchmark_group("grid_american_put");
    group.sample_size(20);

    for nodes in [100_usize, 200, 400] {
        let engine = GridPricer::new(nodes, 0.01);
        group.bench_with_input(BenchmarkId::from_parameter(nodes), &nodes, |b, _| {
            b.iter(|| {
                let px = engine
                    .price(black_box(&spec), black_box(&curve))
                    .expect("pricing should succeed")
                    .price;
                black_box(px)
            })
        });
    }

    group.finish();
}

fn bench_path_cliquet(c: &mut Criterion) {
    let curve = benchmark_curve();
    let mut points = vec![ResetPoint::fixed(0, 100.0)];
    points.extend(quarterly_resets().points().iter().copied());
    let option = PathOption::new(
        100.0,
        1.0,
        PathPayoff::Cliquet {
            strike: 1.0,
            local_cap: 0.05,
            local_floor: Some(0.0),
            global_floor: 0.0,
        },
        ResetSchedule::new(points).expect("benchmark resets should be valid"),
    );
    let mut group = c.benchmark_group("path_cliquet");
    group.sample_size(10);

    for trials in [10_000_usize, 100_000] {
        let engine = PathPricer::new(trials, 42);
        group.bench_with_input(BenchmarkId::from_parameter(trials), &trials, |b, _| {
            b.iter(|| {
                let px = engine
                    .price(black_box(&option), black_box(&curve))
                    .expect("pricing should succeed")
                    .price;
                black_box(px)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_black_scholes_european,
    bench_asian_moment,
    bench_lattice_steps,
    bench_grid_nodes,
    bench_path_cliquet
);
criterion_main!(benches);
