//! Benchmarks for queue throughput and snapshot copy-on-write.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use flowctx::cancellation::CancellationToken;
use flowctx::context::{AmbientContextStore, ContextSnapshot};
use flowctx::queue::BackgroundTaskQueue;
use flowctx::testing::TestIdentity;

fn snapshot_benchmark(c: &mut Criterion) {
    let base = (0..16).fold(TestIdentity::new().snapshot(), |snapshot, i| {
        snapshot
            .with_extra(&format!("key-{i}"), i)
            .unwrap_or(snapshot)
    });

    c.bench_function("snapshot_clone", |b| b.iter(|| black_box(base.clone())));

    c.bench_function("snapshot_with_extra", |b| {
        b.iter(|| black_box(base.with_extra("hot", 1_u64)))
    });

    c.bench_function("snapshot_with_tenant", |b| {
        b.iter(|| black_box(base.with_tenant_id(Some("other".to_string()))))
    });
}

fn queue_benchmark(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| panic!("failed to build runtime: {e}"));
    let identity = TestIdentity::new().snapshot();

    c.bench_function("enqueue_dequeue_1000", |b| {
        b.iter_batched(
            || BackgroundTaskQueue::new(1000).unwrap_or_else(|e| panic!("{e}")),
            |queue| {
                runtime.block_on(AmbientContextStore::scope(identity.clone(), async {
                    let token = CancellationToken::new();
                    for i in 0..1000_u32 {
                        let _ = queue.enqueue(i).await;
                    }
                    for _ in 0..1000 {
                        let _ = black_box(queue.dequeue(&token).await);
                    }
                }));
            },
            BatchSize::SmallInput,
        );
    });

    c.bench_function("capture_empty_context", |b| {
        let queue = BackgroundTaskQueue::new(1).unwrap_or_else(|e| panic!("{e}"));
        b.iter(|| {
            runtime.block_on(AmbientContextStore::scope(ContextSnapshot::new(), async {
                let _ = queue.enqueue(black_box(1_u8)).await;
                black_box(queue.try_dequeue())
            }))
        });
    });
}

criterion_group!(benches, snapshot_benchmark, queue_benchmark);
criterion_main!(benches);
