//! Criterion benchmarks for stepping the reference profile.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use helion_bench::{pion, solenoid_stepper, standard_registry};
use helion_extension::ExtensionList;

fn bench_step_vacuum(c: &mut Criterion) {
    let stepper = solenoid_stepper(false);
    let mut list = standard_registry();
    c.bench_function("step_vacuum", |b| {
        b.iter(|| {
            let mut state = pion(false);
            black_box(stepper.step(&mut state, &mut list).unwrap());
        });
    });
}

fn bench_step_silicon(c: &mut Criterion) {
    let stepper = solenoid_stepper(false);
    let mut list = standard_registry();
    c.bench_function("step_silicon", |b| {
        b.iter(|| {
            let mut state = pion(true);
            black_box(stepper.step(&mut state, &mut list).unwrap());
        });
    });
}

fn bench_step_with_covariance(c: &mut Criterion) {
    let stepper = solenoid_stepper(true);
    let mut list = standard_registry();
    c.bench_function("step_vacuum_covariance", |b| {
        b.iter(|| {
            let mut state = pion(false).with_covariance(helion_core::Jacobian::identity());
            black_box(stepper.step(&mut state, &mut list).unwrap());
        });
    });
}

fn bench_propagate_1m(c: &mut Criterion) {
    let stepper = solenoid_stepper(false);
    c.bench_function("propagate_1m_baseline", |b| {
        b.iter(|| {
            let mut state = pion(false);
            let mut list = ExtensionList::empty();
            black_box(stepper.propagate(&mut state, &mut list, 1000.0).unwrap());
        });
    });
    c.bench_function("propagate_1m_standard", |b| {
        b.iter(|| {
            let mut state = pion(false);
            let mut list = standard_registry();
            black_box(stepper.propagate(&mut state, &mut list, 1000.0).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_step_vacuum,
    bench_step_silicon,
    bench_step_with_covariance,
    bench_propagate_1m
);
criterion_main!(benches);
