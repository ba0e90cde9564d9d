//! Entity store benchmarks.

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use entifs_bench::utils::{populate, random_fields, temp_store};
use entifs_core::{Entity, Key, ListOptions, Store};

/// Benchmark the first id allocation of a freshly opened store, which has
/// to probe past every existing entity.
fn bench_generate_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_id");

    for existing in [0, 100, 1000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(existing),
            existing,
            |b, &existing| {
                let (_dir, entities) = temp_store();
                populate(&entities, "item", existing);
                let base = entities.store().base().to_path_buf();
                b.iter_batched(
                    || Store::open(&base).unwrap(),
                    |store| black_box(store.generate_id("item").unwrap()),
                    BatchSize::SmallInput,
                );
            },
        );
    }
    group.finish();
}

/// Benchmark single entity saves with auto-commit.
fn bench_single_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_save");

    for fields in [1, 8, 64].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(fields), fields, |b, &fields| {
            let (_dir, store) = temp_store();
            let entity = Entity::new(
                Key::new("doc", "1").unwrap(),
                random_fields(fields, 32),
            );
            b.iter(|| store.save(black_box(&entity), None).unwrap());
        });
    }
    group.finish();
}

/// Benchmark committing many updates in one transaction.
fn bench_batch_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_commit");

    for batch_size in [10, 100].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, &batch_size| {
                let (_dir, store) = temp_store();
                let entities: Vec<_> = (0..batch_size)
                    .map(|i| {
                        Entity::new(
                            Key::new("row", i.to_string()).unwrap(),
                            random_fields(4, 16),
                        )
                    })
                    .collect();

                b.iter(|| {
                    store
                        .transaction(|txn| {
                            for entity in &entities {
                                store.save(entity, Some(&mut *txn))?;
                            }
                            Ok(())
                        })
                        .unwrap();
                });
            },
        );
    }
    group.finish();
}

/// Benchmark sorted, windowed listing.
fn bench_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("list");

    for count in [100, 1000].iter() {
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let (_dir, store) = temp_store();
            populate(&store, "item", count);
            let options = ListOptions::new().order_by("score").descending().max(10);
            b.iter(|| black_box(store.list("item", &options).unwrap()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_generate_id,
    bench_single_save,
    bench_batch_commit,
    bench_list,
);
criterion_main!(benches);
