//! # EsoxSolutions.LimitedPool
//!
//! Bounded, async object pool for Rust. Caps the number of simultaneously
//! checked out instances of an expensive resource, reuses returned
//! instances, and queues acquirers once the cap is reached.
//!
//! ## Features
//!
//! - Fixed capacity, instances created lazily through a [`Factory`]
//! - Automatic return of objects via RAII (Drop trait)
//! - FIFO hand-off of released objects to blocked acquirers
//! - Cancellation through [`CancellationToken`](tokio_util::sync::CancellationToken),
//!   timeouts, or simply dropping the acquire future
//! - Factory failures reported to the caller without leaking capacity
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_limitedpool::Pool;
//! use std::convert::Infallible;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let pool = Pool::from_fn(4, || Ok::<_, Infallible>(String::from("connection"))).unwrap();
//! {
//!     let obj = pool.acquire(&CancellationToken::new()).await.unwrap();
//!     println!("Got: {}", *obj);
//!     // Object automatically returned when `obj` goes out of scope
//! }
//! assert_eq!(pool.count(), (0, 4));
//! # }
//! ```

mod pool;
mod config;
mod factory;
mod waiter;
mod errors;

pub use pool::{Pool, PooledObject};
pub use config::PoolConfiguration;
pub use factory::{Factory, FnFactory};
pub use errors::{PoolError, PoolResult};
