use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sorted_ids::{SortedIdSet, SortedIdsConfig};

fn prim_path(scope: &str, i: usize) -> String {
    format!("/World/{}_{:04}/prim_{:06}", scope, i % 100, i)
}

fn populated(n: usize) -> SortedIdSet<String> {
    let mut set: SortedIdSet<String> = (0..n).map(|i| prim_path("group", i)).collect();
    set.resolve();
    set
}

fn bench_bulk_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_ids_bulk_insert");
    group.sample_size(20);

    for n in [1_000, 10_000, 100_000] {
        let paths: Vec<String> = (0..n).rev().map(|i| prim_path("group", i)).collect();
        group.bench_with_input(BenchmarkId::new("insert_then_ids", n), &paths, |b, paths| {
            b.iter(|| {
                let mut set = SortedIdSet::new();
                for p in paths {
                    set.insert(p.clone());
                }
                black_box(set.ids().len())
            });
        });
    }

    group.finish();
}

fn bench_subtree_rename(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_ids_rename");
    group.sample_size(20);

    let base = populated(100_000).ids().to_vec();
    for renamed in [100, 1_000] {
        group.bench_with_input(BenchmarkId::new("interleaved", renamed), &renamed, |b, &renamed| {
            b.iter_batched(
                || {
                    let mut set: SortedIdSet<String> = base.iter().cloned().collect();
                    set.resolve();
                    set
                },
                |mut set| {
                    for i in 0..renamed {
                        set.remove(prim_path("group", i * 100));
                        set.insert(prim_path("renamed", i * 100));
                    }
                    black_box(set.ids().len())
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

fn bench_remove_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("sorted_ids_remove_strategy");
    group.sample_size(20);

    // ratio 1 always searches, a huge ratio always takes the difference pass
    for (name, ratio) in [("search", 1usize), ("difference", usize::MAX)] {
        let config = SortedIdsConfig {
            remove_search_ratio: ratio,
            ..Default::default()
        };
        group.bench_function(name, |b| {
            b.iter_batched(
                || {
                    let mut set = SortedIdSet::with_config(config.clone()).unwrap();
                    set.extend(0u64..200_000);
                    set.resolve();
                    set
                },
                |mut set| {
                    for i in (0..200_000u64).step_by(5_000) {
                        set.remove(i);
                    }
                    black_box(set.ids().len())
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_bulk_insert,
    bench_subtree_rename,
    bench_remove_strategies,
);
criterion_main!(benches);
