// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
use std::sync::Arc;

use canopy_broad::{BroadPhaseConfig, DynamicAabbTreeManager};
use canopy_geom::{CollisionGeometry, CollisionObject, Shape, Transform};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn scene(n: usize) -> Vec<CollisionObject> {
    let mut rng = StdRng::seed_from_u64(0xCA70_0001);
    // Keep density roughly constant as n grows.
    let extent = (n as f32).cbrt() * 2.0;
    (0..n)
        .map(|_| {
            let p = Vec3::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
            );
            let shape = Shape::cuboid(Vec3::splat(rng.gen_range(0.1..0.5))).expect("cuboid");
            let geometry = Arc::new(CollisionGeometry::new(shape));
            CollisionObject::new(geometry, Transform::from_translation(p)).expect("finite pose")
        })
        .collect()
}

fn bench_bulk_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_build");
    for &n in &[100usize, 1_000, 10_000] {
        let objects = scene(n);
        group.throughput(Throughput::Elements(n as u64));
        for (label, init_level) in [("topdown", 0u32), ("morton", 1)] {
            let config = BroadPhaseConfig {
                tree_init_level: init_level,
                ..BroadPhaseConfig::default()
            };
            group.bench_with_input(BenchmarkId::new(label, n), &objects, |b, objects| {
                b.iter_batched(
                    || DynamicAabbTreeManager::with_config(config.clone()).expect("config"),
                    |mut mgr| {
                        mgr.register_objects(objects.iter().enumerate()).expect("register");
                        criterion::black_box(mgr.tree().max_height());
                    },
                    BatchSize::SmallInput,
                )
            });
        }
    }
    group.finish();
}

fn bench_incremental_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_insert");
    for &n in &[100usize, 1_000, 10_000] {
        let objects = scene(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &objects, |b, objects| {
            b.iter_batched(
                DynamicAabbTreeManager::new,
                |mut mgr| {
                    for (i, o) in objects.iter().enumerate() {
                        mgr.register_object(i, o).expect("register");
                    }
                    // Include the rebalance the first query would pay for.
                    mgr.setup();
                    criterion::black_box(mgr.tree().max_height());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_bulk_build, bench_incremental_insert);
criterion_main!(benches);
