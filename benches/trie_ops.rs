//! Trie Operation Benchmarks
//!
//! Insert, lookup, delete and full iteration over an in-memory node store.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use state_trie::{Cancellation, MemoryNodeStore, MerklePatriciaTrie, NodeTypes, Path};
use std::sync::Arc;

fn paths(count: usize) -> Vec<Path> {
    (0..count)
        .map(|i| Path::from_bytes(format!("account-{:08}", i * 7919).as_bytes()))
        .collect()
}

fn filled_trie(paths: &[Path]) -> MerklePatriciaTrie {
    let mut trie = MerklePatriciaTrie::new(Arc::new(MemoryNodeStore::new()), 1);
    for (i, path) in paths.iter().enumerate() {
        trie.insert(path, &format!("balance {}", i)).unwrap();
    }
    trie
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_insert");

    for count in [100, 1_000].iter() {
        let paths = paths(*count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &paths, |b, paths| {
            b.iter(|| black_box(filled_trie(paths).root()));
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("trie_get");

    for count in [100, 1_000].iter() {
        let paths = paths(*count);
        let trie = filled_trie(&paths);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &paths, |b, paths| {
            b.iter(|| {
                for path in paths {
                    black_box(trie.get_node_value(path).unwrap());
                }
            });
        });
    }

    group.finish();
}

fn bench_delete(c: &mut Criterion) {
    let paths = paths(1_000);

    c.bench_function("trie_delete_half", |b| {
        b.iter_batched(
            || filled_trie(&paths),
            |mut trie| {
                for path in paths.iter().step_by(2) {
                    trie.delete(path).unwrap();
                }
                black_box(trie.root())
            },
            criterion::BatchSize::LargeInput,
        );
    });
}

fn bench_iterate(c: &mut Criterion) {
    let trie = filled_trie(&paths(1_000));
    let cancel = Cancellation::new();

    c.bench_function("trie_iterate_values", |b| {
        b.iter(|| black_box(trie.values(&cancel).unwrap().len()));
    });

    c.bench_function("trie_iterate_nodes", |b| {
        b.iter(|| {
            let mut seen = 0usize;
            trie.iterate(
                &cancel,
                |_, _, _| {
                    seen += 1;
                    Ok(())
                },
                NodeTypes::ALL_NODES,
            )
            .unwrap();
            black_box(seen)
        });
    });
}

criterion_group!(benches, bench_insert, bench_get, bench_delete, bench_iterate);
criterion_main!(benches);
