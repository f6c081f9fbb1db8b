//! Generation step throughput

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use torus_life::{CellState, Field};

fn soup(size: usize) -> Field {
    let mut f = Field::new(size, size).unwrap();
    let mut seed = 12345u64;
    for y in 0..size {
        for x in 0..size {
            seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            f.set_state(x, y, CellState::from(seed % 3 == 0)).unwrap();
        }
    }
    f
}

fn benchmark_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("field_step");

    for size in [25, 100, 250].iter() {
        let field = soup(*size);
        group.bench_with_input(BenchmarkId::new("size", size), size, |b, _| {
            b.iter(|| black_box(&field).step());
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_step);
criterion_main!(benches);
