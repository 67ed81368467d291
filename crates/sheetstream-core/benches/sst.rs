use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sheetstream_core::{SharedStringTable, SstOptions};

fn sst_intern_unique_benchmark(c: &mut Criterion) {
    c.bench_function("sst_intern_unique_10k", |b| {
        b.iter(|| {
            let sst = SharedStringTable::new(SstOptions::default()).unwrap();
            for i in 0..10_000 {
                black_box(sst.intern(&format!("value-{}", i)).unwrap());
            }
        });
    });
}

fn sst_intern_repeated_benchmark(c: &mut Criterion) {
    let sst = SharedStringTable::new(SstOptions::default()).unwrap();
    let words: Vec<String> = (0..100).map(|i| format!("category-{}", i)).collect();
    for w in &words {
        sst.intern(w).unwrap();
    }

    c.bench_function("sst_intern_repeated_10k", |b| {
        b.iter(|| {
            for i in 0..10_000 {
                black_box(sst.intern(&words[i % words.len()]).unwrap());
            }
        });
    });
}

fn sst_get_benchmark(c: &mut Criterion) {
    let sst = SharedStringTable::new(SstOptions::default()).unwrap();
    for i in 0..10_000 {
        sst.intern(&format!("value-{}", i)).unwrap();
    }
    sst.commit().unwrap();

    c.bench_function("sst_get_10k", |b| {
        b.iter(|| {
            for id in 0..10_000u32 {
                black_box(sst.get(id).unwrap());
            }
        });
    });
}

criterion_group!(
    benches,
    sst_intern_unique_benchmark,
    sst_intern_repeated_benchmark,
    sst_get_benchmark
);
criterion_main!(benches);
