use criterion::{Criterion, black_box, criterion_group, criterion_main};
use esox_limitedpool::Pool;
use std::convert::Infallible;
use tokio_util::sync::CancellationToken;

fn uncontended(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let pool = Pool::from_fn(8, || Ok::<_, Infallible>(vec![0u8; 4096])).unwrap();
    let cancel = CancellationToken::new();

    c.bench_function("acquire_release_uncontended", |b| {
        b.iter(|| {
            rt.block_on(async {
                let obj = pool.acquire(&cancel).await.unwrap();
                black_box(obj.len());
            })
        })
    });
}

fn contended(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .build()
        .unwrap();
    let pool = Pool::from_fn(2, || Ok::<_, Infallible>(0u64)).unwrap();

    c.bench_function("acquire_release_contended_16_tasks", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut handles = Vec::with_capacity(16);
                for _ in 0..16 {
                    let pool = pool.clone();
                    handles.push(tokio::spawn(async move {
                        let mut obj = pool.acquire(&CancellationToken::new()).await.unwrap();
                        *obj += 1;
                    }));
                }
                for handle in handles {
                    handle.await.unwrap();
                }
            })
        })
    });
}

criterion_group!(benches, uncontended, contended);
criterion_main!(benches);
