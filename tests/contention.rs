use async_trait::async_trait;
use esox_limitedpool::{Factory, Pool, PoolConfiguration, PoolError};
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

struct Conn {
    busy: AtomicBool,
}

fn conn_pool(capacity: usize) -> (Pool<Arc<Conn>>, Arc<AtomicUsize>) {
    let created = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&created);
    let pool = Pool::from_fn(capacity, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, Infallible>(Arc::new(Conn {
            busy: AtomicBool::new(false),
        }))
    })
    .unwrap();
    (pool, created)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_double_delivery_under_contention() {
    let capacity = 4;
    let (pool, created) = conn_pool(capacity);
    let mut handles = Vec::new();

    for task in 0..32u64 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut acquired = 0;
            for round in 0..50u64 {
                let cancel = CancellationToken::new();
                // Every third attempt gives up quickly to exercise the cancellation path.
                if (task + round) % 3 == 0 {
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(Duration::from_micros(50)).await;
                        cancel.cancel();
                    });
                }

                match pool.acquire(&cancel).await {
                    Ok(conn) => {
                        assert!(!conn.busy.swap(true, Ordering::SeqCst), "object handed out twice");
                        let (used, _) = pool.count();
                        assert!(used <= capacity);
                        tokio::task::yield_now().await;
                        conn.busy.store(false, Ordering::SeqCst);
                        acquired += 1;
                    }
                    Err(PoolError::Cancelled) => {}
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
            acquired
        }));
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap();
    }

    assert!(total > 0);
    assert!(created.load(Ordering::SeqCst) <= capacity);
    assert_eq!(pool.count(), (0, capacity));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_timed_out_waiters_do_not_lose_objects() {
    let capacity = 2;
    let (pool, created) = conn_pool(capacity);
    let mut handles = Vec::new();

    for _ in 0..16 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..20 {
                let result = pool
                    .acquire_timeout(&CancellationToken::new(), Duration::from_micros(200))
                    .await;
                if let Ok(conn) = result {
                    tokio::task::yield_now().await;
                    drop(conn);
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(pool.count(), (0, capacity));
    assert!(created.load(Ordering::SeqCst) <= capacity);

    // Every created object is back and reusable without a new creation.
    let cancel = CancellationToken::new();
    let mut held = Vec::new();
    for _ in 0..capacity {
        held.push(pool.acquire(&cancel).await.unwrap());
    }
    assert!(created.load(Ordering::SeqCst) <= capacity);
    assert_eq!(pool.count(), (capacity, 0));
}

/// Fails its first call once the gate opens, succeeds afterwards.
struct FlakyFactory {
    calls: AtomicUsize,
    gate: Arc<Notify>,
}

#[async_trait]
impl Factory for FlakyFactory {
    type Item = usize;
    type Error = String;

    async fn create(&self) -> Result<usize, String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.gate.notified().await;
            return Err("connection refused".to_string());
        }
        Ok(call)
    }
}

#[tokio::test]
async fn test_failed_creation_hands_slot_to_waiter() {
    let gate = Arc::new(Notify::new());
    let factory = FlakyFactory {
        calls: AtomicUsize::new(0),
        gate: Arc::clone(&gate),
    };
    let pool = Pool::new(factory, PoolConfiguration::new().with_capacity(1)).unwrap();

    let creator_pool = pool.clone();
    let creator = tokio::spawn(async move {
        creator_pool.acquire(&CancellationToken::new()).await.map(|obj| *obj)
    });
    while pool.count() != (1, 0) {
        tokio::task::yield_now().await;
    }

    let waiter_pool = pool.clone();
    let waiter = tokio::spawn(async move {
        waiter_pool.acquire(&CancellationToken::new()).await.map(|obj| *obj)
    });
    tokio::task::yield_now().await;
    assert!(!waiter.is_finished());

    // The first creation fails; its slot must go to the waiter.
    gate.notify_one();

    assert_eq!(
        creator.await.unwrap(),
        Err(PoolError::Create("connection refused".to_string()))
    );
    assert_eq!(waiter.await.unwrap(), Ok(1));
    assert_eq!(pool.count(), (0, 1));
}
