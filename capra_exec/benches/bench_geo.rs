//! # Distance Calculation Benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use capra_lib::{
    geo::{self, Coordinate},
    path_store::PathDocument,
};

fn geo_benchmark(c: &mut Criterion) {
    // ---- Build a dummy path ----

    // Zig-zag of 500 nodes around the test field
    let nodes: Vec<_> = (0..500)
        .map(|i| {
            json!({
                "uuid": format!("n{}", i),
                "sequence_number": i,
                "position": {
                    "x": 51.688 + 0.0001 * i as f64,
                    "y": 5.287 + if i % 2 == 0 { 0.0 } else { 0.0002 },
                    "z": 0.0
                }
            })
        })
        .collect();
    let doc = PathDocument::from_value(json!({ "nodes": nodes }), "bench");

    let warsaw = Coordinate::new(52.2296756, 21.0122287);
    let london = Coordinate::new(51.5074, 0.1278);

    // ---- Benchmarks ----

    c.bench_function("haversine", |b| {
        b.iter(|| geo::pairwise_distance_and_bearing(black_box(warsaw), black_box(london)))
    });

    c.bench_function("geodesic", |b| {
        b.iter(|| geo::geodesic_distance_m(black_box(warsaw), black_box(london)))
    });

    c.bench_function("segment_distances_500", |b| {
        b.iter(|| geo::segment_distances(black_box(&doc)).unwrap())
    });
}

criterion_group!(benches, geo_benchmark);
criterion_main!(benches);
