// EsoxSolutions.LimitedPool
// Bounded async object pool with FIFO hand-off

// This is just a binary wrapper - the actual library is in lib.rs
// Run examples with: cargo run --example basic

use esox_limitedpool::Pool;
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== EsoxSolutions.LimitedPool ===");
    println!("See demos/ directory for usage examples");
    println!("Run: cargo run --example basic");
    println!();

    // Quick demo: four workers share two objects
    println!("Quick Demo:");
    let created = AtomicUsize::new(0);
    let pool = Pool::from_fn(2, move || {
        Ok::<_, Infallible>(created.fetch_add(1, Ordering::SeqCst))
    })
    .expect("capacity is non-zero");

    let cancel = CancellationToken::new();
    let mut handles = Vec::new();
    for worker in 0..4 {
        let pool = pool.clone();
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move {
            match pool.acquire(&cancel).await {
                Ok(obj) => {
                    println!("  Worker {} got object {}", worker, *obj);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                Err(e) => println!("  Worker {}: {}", worker, e),
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    let (used, available) = pool.count();
    println!("  Used: {}, available: {}", used, available);
}
