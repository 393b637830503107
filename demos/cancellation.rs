//! Waiting, cancellation and timeout examples

use esox_limitedpool::{Pool, PoolError};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    println!("=== EsoxSolutions.LimitedPool - Cancellation Examples ===\n");

    // Example 1: Waiting for a released object
    wait_for_release().await;

    // Example 2: Cancelling a waiter
    cancel_waiter().await;

    // Example 3: Timeout
    with_timeout().await;

    // Example 4: Concurrent access
    concurrent_access().await;
}

async fn wait_for_release() {
    println!("1. Wait for Release:");
    let pool = Pool::from_fn(1, || Ok::<_, Infallible>(7)).unwrap();
    let holder = pool.acquire(&CancellationToken::new()).await.unwrap();

    let waiter_pool = pool.clone();
    let waiter = tokio::spawn(async move {
        let obj = waiter_pool.acquire(&CancellationToken::new()).await.unwrap();
        println!("   Waiter received object {}", *obj);
    });

    sleep(Duration::from_millis(50)).await;
    println!("   Releasing held object");
    drop(holder);
    waiter.await.unwrap();
    println!();
}

async fn cancel_waiter() {
    println!("2. Cancel a Waiter:");
    let pool = Pool::from_fn(1, || Ok::<_, Infallible>(7)).unwrap();
    let _holder = pool.acquire(&CancellationToken::new()).await.unwrap();

    let cancel = CancellationToken::new();
    let waiter_pool = pool.clone();
    let waiter_cancel = cancel.clone();
    let waiter = tokio::spawn(async move { waiter_pool.acquire(&waiter_cancel).await.map(|_| ()) });

    sleep(Duration::from_millis(50)).await;
    cancel.cancel();
    match waiter.await.unwrap() {
        Err(PoolError::Cancelled) => println!("   Waiter cancelled, count: {:?}", pool.count()),
        other => println!("   Unexpected: {:?}", other),
    }
    println!();
}

async fn with_timeout() {
    println!("3. Acquire with Timeout:");
    let pool = Pool::from_fn(1, || Ok::<_, Infallible>(7)).unwrap();
    let _holder = pool.acquire(&CancellationToken::new()).await.unwrap();

    let result = pool
        .acquire_timeout(&CancellationToken::new(), Duration::from_millis(100))
        .await;
    match result {
        Ok(_) => println!("   Got object"),
        Err(e) => println!("   Error: {}", e),
    }
    println!();
}

async fn concurrent_access() {
    println!("4. Concurrent Access:");

    let pool = Arc::new(Pool::from_fn(3, || Ok::<_, Infallible>(0u64)).unwrap());
    let mut handles = vec![];

    for i in 0..10 {
        let pool_clone = Arc::clone(&pool);
        let handle = tokio::spawn(async move {
            let mut obj = pool_clone.acquire(&CancellationToken::new()).await.unwrap();
            *obj += 1;
            println!("   Task {} got object used {} times", i, *obj);
            sleep(Duration::from_millis(20)).await;
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.await.unwrap();
    }

    println!("   Final count: {:?}", pool.count());
}
