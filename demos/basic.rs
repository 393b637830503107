//! Basic usage examples for Pool

use esox_limitedpool::{Pool, PoolConfiguration, PooledObject, FnFactory};
use std::convert::Infallible;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    println!("=== EsoxSolutions.LimitedPool - Basic Examples ===\n");

    // Example 1: Simple pool with a closure factory
    simple_pool().await;

    // Example 2: Pool with configuration
    configured_pool().await;

    // Example 3: Manual release
    manual_release().await;

    // Example 4: Discarding broken objects
    discard().await;
}

async fn simple_pool() {
    println!("1. Simple Pool:");
    let pool = Pool::from_fn(3, || Ok::<_, Infallible>(vec![0u8; 16])).unwrap();
    let cancel = CancellationToken::new();

    {
        let obj = pool.acquire(&cancel).await.unwrap();
        println!("   Got buffer of {} bytes", obj.len());
        // Object automatically returned when dropped
    }

    println!("   Count after return: {:?}\n", pool.count());
}

async fn configured_pool() {
    println!("2. Configured Pool:");

    let config = PoolConfiguration::new().with_capacity(5);
    let pool = Pool::new(FnFactory::new(|| Ok::<_, Infallible>(String::new())), config).unwrap();
    let cancel = CancellationToken::new();

    {
        let _obj1 = pool.acquire(&cancel).await.unwrap();
        let _obj2 = pool.acquire(&cancel).await.unwrap();
        let (used, available) = pool.count();
        println!("   Used objects: {}", used);
        println!("   Available capacity: {}", available);
    }

    println!("   After return - Count: {:?}\n", pool.count());
}

async fn manual_release() {
    println!("3. Manual Release:");
    let pool = Pool::from_fn(1, || Ok::<_, Infallible>(42)).unwrap();

    let obj = pool.acquire(&CancellationToken::new()).await.unwrap();
    let raw = PooledObject::into_inner(obj);
    println!("   Took {} out of the pool, count: {:?}", raw, pool.count());

    pool.release(raw);
    println!("   Released, count: {:?}\n", pool.count());
}

async fn discard() {
    println!("4. Discard:");
    let pool = Pool::from_fn(1, || Ok::<_, Infallible>("fresh connection")).unwrap();

    let obj = pool.acquire(&CancellationToken::new()).await.unwrap();
    println!("   Using {}, then it breaks", *obj);
    PooledObject::discard(obj);

    println!("   Count after discard: {:?}", pool.count());
}
