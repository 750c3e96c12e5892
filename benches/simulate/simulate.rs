use criterion::{criterion_group, criterion_main, Criterion};
use seihrd::ode::{Rk4, SolverConfig};
use seihrd::{Scenario, Trajectory};

fn belgium_spring_2020(solver: SolverConfig) -> Trajectory {
    Scenario::belgium_spring_2020()
        .with_solver(solver)
        .simulate()
        .expect("failed to simulate the Belgium scenario")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("belgium dormand-prince", |bencher| {
        bencher.iter_with_large_drop(|| belgium_spring_2020(SolverConfig::default()))
    });
    c.bench_function("belgium rk4", |bencher| {
        bencher.iter_with_large_drop(|| belgium_spring_2020(Rk4::default().into()))
    });
}

criterion_group!(simulate_benches, criterion_benchmark);
criterion_main!(simulate_benches);
