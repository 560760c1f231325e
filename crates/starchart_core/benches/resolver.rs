//! History resolution benchmarks for starchart_core.
//!
//! Run with: `cargo bench -p starchart_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use starchart_core::prelude::*;
use starchart_test_utils::fixtures::{planet, universe_from, DumpBuilder};

const TICKS: u32 = 500;

/// A galaxy of twelve planets, each present at every tick.
fn busy_universe() -> Universe {
    universe_from(
        (1..=TICKS)
            .map(|tick| {
                (1..=12).fold(DumpBuilder::at(tick), |builder, z| {
                    let amount = i64::from(tick * z);
                    builder.planet(planet(&format!("p{z}"), 1, 1, z, amount, amount, amount))
                })
                .build()
            })
            .collect(),
    )
}

/// Resolves snapshots against a long history.
pub fn resolver_benchmark(c: &mut Criterion) {
    let universe = busy_universe();
    let key = PlanetKey { x: 1, y: 1, z: 6 };

    c.bench_function("load_snapshot_exact", |b| {
        b.iter(|| {
            universe
                .planets()
                .load_snapshot(black_box(&key), black_box(TICKS / 2), LookupMode::Exact, true)
                .map(|snapshot| snapshot.tick)
        });
    });

    c.bench_function("load_snapshot_closest", |b| {
        b.iter(|| {
            universe
                .planets()
                .load_snapshot(black_box(&key), black_box(TICKS + 40), LookupMode::Closest, true)
                .map(|snapshot| snapshot.tick)
        });
    });

    c.bench_function("load_by_key_active", |b| {
        b.iter(|| universe.planets().load_by_key(black_box(&key), true).map(|record| record.id));
    });
}

criterion_group!(benches, resolver_benchmark);
criterion_main!(benches);
