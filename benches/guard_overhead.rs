//! Measures the per-call overhead the guards add around a trivial async
//! operation, compared against an unguarded executor baseline.

use breakwater::reliability::{
    Bulkhead, BulkheadConfig, CircuitBreaker, CircuitBreakerConfig, Executor,
};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tokio::runtime::Runtime;

async fn operation() -> Result<u64, String> {
    Ok(black_box(42))
}

fn bench_executor_overhead(c: &mut Criterion) {
    // Silence guard logging so the measurement reflects the guards alone.
    let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::ERROR).try_init();

    let rt = Runtime::new().expect("Failed to create tokio runtime");

    let mut group = c.benchmark_group("executor_overhead");

    let unguarded = Executor::new();
    group.bench_function("unguarded", |b| {
        b.to_async(&rt).iter(|| async {
            unguarded.execute(operation).await.unwrap();
        });
    });

    let breaker_only =
        Executor::new().with_breaker(CircuitBreaker::new(CircuitBreakerConfig::default()));
    group.bench_function("breaker_only", |b| {
        b.to_async(&rt).iter(|| async {
            breaker_only.execute(operation).await.unwrap();
        });
    });

    let bulkhead_only =
        Executor::new().with_bulkhead(Bulkhead::new(BulkheadConfig { capacity: 16 }));
    group.bench_function("bulkhead_only", |b| {
        b.to_async(&rt).iter(|| async {
            bulkhead_only.execute(operation).await.unwrap();
        });
    });

    let both = Executor::new()
        .with_breaker(CircuitBreaker::new(CircuitBreakerConfig::default()))
        .with_bulkhead(Bulkhead::new(BulkheadConfig { capacity: 16 }));
    group.bench_function("breaker_and_bulkhead", |b| {
        b.to_async(&rt).iter(|| async {
            both.execute(operation).await.unwrap();
        });
    });

    group.finish();
}

fn bench_open_fast_fail(c: &mut Criterion) {
    let rt = Runtime::new().expect("Failed to create tokio runtime");

    // Trip the breaker once; with a long open timeout it stays open for the
    // whole measurement, so every call takes the fast-fail path.
    let breaker = CircuitBreaker::new(CircuitBreakerConfig {
        max_failures: 1,
        open_timeout_ms: 3_600_000,
        ..CircuitBreakerConfig::default()
    });
    rt.block_on(async {
        let _ = breaker.call(|| async { Err::<u64, _>("trip".to_string()) }).await;
    });
    let executor = Executor::new().with_breaker(breaker);

    c.bench_function("open_fast_fail", |b| {
        b.to_async(&rt).iter(|| async {
            let _ = executor.execute(operation).await;
        });
    });
}

criterion_group!(benches, bench_executor_overhead, bench_open_fast_fail);
criterion_main!(benches);
