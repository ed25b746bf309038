//! BFS-per-source vs Floyd–Warshall on generated school graphs.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use whistle_core::SimulationConfig;
use whistle_core::graph::{build_school, generate_friendships};
use whistle_core::propagation::{bfs_all_pairs, floyd_warshall};

fn bench_engines(c: &mut Criterion) {
    let mut group = c.benchmark_group("all_pairs");
    for students in [50_usize, 100, 200] {
        let config = SimulationConfig {
            student_count: students,
            tutor_block_size: students.div_ceil(5),
            ..SimulationConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(42);
        let pairs = generate_friendships(students, config.friendship_degree, &mut rng)
            .expect("generate friendships");
        let graph = build_school(&config, &pairs).expect("build school");

        group.bench_with_input(BenchmarkId::new("bfs", students), &graph, |b, g| {
            b.iter(|| bfs_all_pairs(g));
        });
        group.bench_with_input(BenchmarkId::new("floyd_warshall", students), &graph, |b, g| {
            b.iter(|| floyd_warshall(g));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_engines);
criterion_main!(benches);
