//! Benchmarks for the annotated disk cache and the token index.
//!
//! Run with: cargo bench

use annotated_disk_cache::{
    metadata, AnnotatedCache, BoundedTokenIndex, IndexConfig, ListCollector, MemoryIndex, MetaValue, Metadata,
    SimpleTokenizer, UsedDirectories,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use tempfile::TempDir;

fn open_cache(dir: &TempDir, max_size: u64) -> AnnotatedCache {
    AnnotatedCache::open(&UsedDirectories::new(), dir.path(), 1, max_size).unwrap()
}

/// Benchmark single-threaded put/get operations.
fn bench_single_threaded(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_threaded");

    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, 256 << 20);
    let meta = metadata([("source", MetaValue::from("bench")), ("rank", MetaValue::from(1))]);

    // Pre-populate some keys
    for i in 0..1_000 {
        cache.put_text(&format!("key_{}", i), &format!("value_{}", i), &meta).unwrap();
    }

    group.bench_function("get_existing", |b| {
        let mut i = 0;
        b.iter(|| {
            let key = format!("key_{}", i % 1_000);
            black_box(cache.get_text_entry(&key).unwrap());
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0;
        b.iter(|| {
            let key = format!("missing_{}", i);
            black_box(cache.get_text(&key).unwrap());
            i += 1;
        });
    });

    group.bench_function("put_existing", |b| {
        let mut i = 0;
        b.iter(|| {
            let key = format!("key_{}", i % 1_000);
            cache.put_text(&key, "updated_value", &meta).unwrap();
            i += 1;
        });
    });

    group.bench_function("contains", |b| {
        b.iter(|| black_box(cache.contains("key_1").unwrap()));
    });

    group.finish();
}

/// Benchmark payload sizes.
fn bench_payload_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("payload");

    let dir = TempDir::new().unwrap();
    let cache = open_cache(&dir, 256 << 20);

    for size in [256usize, 4 * 1024, 64 * 1024].iter() {
        let payload = vec![7u8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("put_get_bytes", size), size, |b, _| {
            b.iter(|| {
                cache.put_bytes("blob", &payload, &Metadata::new()).unwrap();
                black_box(cache.get_bytes("blob").unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark concurrent readers with one writer.
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for num_threads in [2, 4, 8].iter() {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(open_cache(&dir, 256 << 20));
        for i in 0..100 {
            cache.put_text(&format!("key_{}", i), "value", &Metadata::new()).unwrap();
        }

        group.throughput(Throughput::Elements(100));
        group.bench_with_input(
            BenchmarkId::new("mixed_ops", num_threads),
            num_threads,
            |b, &num_threads| {
                b.iter(|| {
                    let handles: Vec<_> = (0..num_threads)
                        .map(|t| {
                            let cache = Arc::clone(&cache);
                            std::thread::spawn(move || {
                                for i in 0..100 {
                                    let key = format!("key_{}", (t * 100 + i) % 100);
                                    if t == 0 && i % 5 == 0 {
                                        cache.put_text(&key, "value", &Metadata::new()).unwrap();
                                    } else {
                                        black_box(cache.get_text(&key).unwrap());
                                    }
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the in-memory token index.
fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");

    let config = IndexConfig::new().max_entries_per_key(100);
    let index: MemoryIndex<u64> = MemoryIndex::in_memory(&config).unwrap();
    let words = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel"];

    group.bench_function("index_phrase", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let phrase = format!("{} {}", words[(i % 8) as usize], words[((i + 3) % 8) as usize]);
            black_box(index.index(&phrase, &[i]).unwrap());
            i += 1;
        });
    });

    group.bench_function("find_paged", |b| {
        b.iter(|| {
            let mut hits = ListCollector::new();
            black_box(index.find_with("alpha delta golf", &mut hits, 20, 50).unwrap());
        });
    });

    // Constant eviction: capacity 10, every insert pushes one out
    let small: MemoryIndex<u64> =
        BoundedTokenIndex::new(Default::default(), SimpleTokenizer::new(3), 10).unwrap();
    group.bench_function("index_with_eviction", |b| {
        let mut i = 0u64;
        b.iter(|| {
            small.index_token("hot", &[i]).unwrap();
            i += 1;
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_threaded,
    bench_payload_sizes,
    bench_concurrent,
    bench_index,
);
criterion_main!(benches);
