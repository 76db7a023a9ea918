// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Performance benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hemesh::geometry::grid_patch;
use hemesh::{ExportOptions, HalfEdgeMesh, Primitive, Shading};
use nalgebra::{Point3, Vector2, Vector3};

fn grid_polygons(n: usize) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            positions.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }
    let at = |i: usize, j: usize| j * (n + 1) + i;
    let mut polygons = Vec::with_capacity(n * n);
    for j in 0..n {
        for i in 0..n {
            polygons.push(vec![at(i, j), at(i + 1, j), at(i + 1, j + 1), at(i, j + 1)]);
        }
    }
    (positions, polygons)
}

fn bench_create_faces(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_faces");

    for n in [16, 64] {
        let (positions, polygons) = grid_polygons(n);
        group.bench_with_input(BenchmarkId::new("grid", n), &n, |b, _| {
            b.iter(|| HalfEdgeMesh::from_polygons(black_box(&positions), black_box(&polygons)).unwrap());
        });
    }

    group.finish();
}

fn bench_topology(c: &mut Criterion) {
    let mut group = c.benchmark_group("topology");
    let (positions, polygons) = grid_polygons(32);
    let (mesh, _) = HalfEdgeMesh::from_polygons(&positions, &polygons).unwrap();

    group.bench_function("split_merge_edges", |b| {
        b.iter(|| {
            let mut mesh = mesh.clone();
            let edges: Vec<_> = mesh.halfedge_ids().step_by(2).collect();
            let inserted: Vec<_> = edges
                .into_iter()
                .map(|h| mesh.split_edge(h).unwrap())
                .collect();
            for m in inserted {
                mesh.merge_edges(m).unwrap();
            }
            mesh
        });
    });

    group.bench_function("disconnect_connect", |b| {
        b.iter(|| {
            let mut mesh = mesh.clone();
            let interior: Vec<_> = mesh
                .halfedge_ids()
                .filter(|&h| !mesh.is_boundary_edge(h))
                .step_by(7)
                .take(64)
                .collect();
            for h in interior {
                if mesh.contains_halfedge(h) && !mesh.is_boundary_edge(h) {
                    let (a, b) = mesh.disconnect_edge(h).unwrap();
                    mesh.connect_edges(a, b).unwrap();
                }
            }
            mesh
        });
    });

    group.finish();
}

fn bench_compose(c: &mut Criterion) {
    let mut group = c.benchmark_group("compose");

    for segments in [1, 8, 32] {
        group.bench_with_input(BenchmarkId::new("box", segments), &segments, |b, &n| {
            b.iter(|| {
                Primitive::box_(black_box(Vector3::new(2.0, 2.0, 2.0)), [n, n, n])
                    .to_attributed_mesh()
                    .unwrap()
            });
        });
    }

    group.bench_function("grid_patch_64", |b| {
        b.iter(|| grid_patch(black_box(Vector2::new(1.0, 1.0)), [64, 64]).unwrap());
    });

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    let mesh = Primitive::box_(Vector3::new(2.0, 2.0, 2.0), [32, 32, 32])
        .to_attributed_mesh()
        .unwrap();

    for shading in [Shading::Polygonal, Shading::Smooth, Shading::DirectionalA] {
        let options = ExportOptions {
            shading_override: Some(shading),
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("box_32", shading), &options, |b, options| {
            b.iter(|| mesh.to_mesh(black_box(options)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_create_faces,
    bench_topology,
    bench_compose,
    bench_export
);
criterion_main!(benches);
