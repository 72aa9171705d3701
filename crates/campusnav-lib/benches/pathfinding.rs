use campusnav_lib::{
    apply_padding, find_path, plan_route, smooth_path, GeoBounds, GridConfig, RouteRequest,
    SmoothOptions, OBSTACLE, WALKABLE,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn bounds() -> GeoBounds {
    GeoBounds {
        lat_min: 47.0,
        lat_max: 47.004,
        lng_min: -117.004,
        lng_max: -117.0,
    }
}

/// 200x200 grid with a row of building-sized blocks forcing detours.
fn campus_grid() -> GridConfig {
    let size = 200;
    let mut rows = vec![vec![WALKABLE; size]; size];
    for block in 0..4 {
        let top = 40 + block * 30;
        for r in top..top + 20 {
            for c in 20 + block * 10..size - 20 {
                rows[r][c] = OBSTACLE;
            }
        }
    }
    GridConfig::from_rows(rows, bounds()).expect("grid builds")
}

fn benchmark_pathfinding(c: &mut Criterion) {
    let config = campus_grid();

    c.bench_function("apply_padding_r2", |b| {
        b.iter(|| {
            let cost = apply_padding(&config, 2, None);
            black_box(cost.rows())
        });
    });

    let cost = apply_padding(&config, 2, None);
    c.bench_function("astar_corner_to_corner", |b| {
        b.iter(|| {
            let path = find_path(&cost, (0, 0), (199, 199));
            black_box(path.len())
        });
    });

    let raw = find_path(&cost, (0, 0), (199, 199));
    c.bench_function("smooth_corner_to_corner", |b| {
        let options = SmoothOptions::default();
        b.iter(|| {
            let smoothed = smooth_path(&config, None, &raw, &options);
            black_box(smoothed.points.len())
        });
    });

    c.bench_function("plan_route_end_to_end", |b| {
        let request = RouteRequest::new(config.cell_to_geo(0, 0), config.cell_to_geo(199, 199));
        b.iter(|| {
            let plan = plan_route(&config, &request).expect("endpoints resolve");
            black_box(plan.path.len())
        });
    });
}

criterion_group!(benches, benchmark_pathfinding);
criterion_main!(benches);
