use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};

use worklets::{deps, use_worklet, ContextSelector, MemoSlot, WorkletContext, WorkletContextConfig};

fn bench_round_trip(c: &mut Criterion) {
    let ctx = Arc::new(WorkletContext::new(
        "bench",
        WorkletContextConfig {
            workers: 1,
            queue_capacity: 1024,
        },
    ));
    let mut slot = MemoSlot::new();
    let add = use_worklet(&mut slot, ContextSelector::from(ctx), |(a, b): (u64, u64)| a + b, deps![]);

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));
    group.bench_function("round_trip", |b| {
        b.iter(|| add.call((1, 2)).wait().unwrap());
    });
    group.finish();
}

fn bench_memo_hit(c: &mut Criterion) {
    let mut slot = MemoSlot::new();
    c.bench_function("dispatch/memo_hit", |b| {
        b.iter(|| use_worklet(&mut slot, ContextSelector::Default, |x: u8| x, deps![1, "stable"]));
    });
}

criterion_group!(benches, bench_round_trip, bench_memo_hit);
criterion_main!(benches);
