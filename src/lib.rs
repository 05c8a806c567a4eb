//! # EsoxSolutions.ObjectPool (actor edition)
//!
//! Async object pool for Rust in which a single coordinator task owns all
//! pool state. Callers never take a lock; they exchange messages with the
//! coordinator, which serializes checkout, return, idle expiry and shutdown.
//!
//! ## Features
//!
//! - Bounded checkout: at most `capacity` objects are lent out at once,
//!   further acquires wait
//! - Objects created on demand by a factory closure or a [`Manager`]
//! - LIFO (default) or FIFO reuse of idle objects
//! - Automatic return of objects via RAII (Drop trait)
//! - Cancellable acquire with timeouts; cancellation never loses an object
//! - Per-object idle expiry
//! - Graceful disposal that waits for checked out objects to come back
//! - Pool warm-up/pre-population
//!
//! ## Quick Start
//!
//! ```rust
//! use esox_actorpool::{ObjectPool, PoolConfiguration};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), esox_actorpool::PoolError> {
//! let pool = ObjectPool::new(|| Ok::<_, std::io::Error>(42), PoolConfiguration::default())?;
//! {
//!     let obj = pool.acquire().await?;
//!     println!("Got: {}", *obj);
//!     // Object automatically returned when `obj` goes out of scope
//! }
//! pool.dispose_pool().await;
//! # Ok(())
//! # }
//! ```

mod pool;
mod config;
mod coordinator;
mod entry;
mod manager;
mod status;
mod errors;

pub use pool::{ObjectPool, PooledObject, InstanceFuture};
pub use config::{PoolConfiguration, ReuseOrder};
pub use manager::{Manager, FnManager};
pub use status::{PoolState, PoolStatus};
pub use errors::{BoxError, PoolError, PoolResult};
