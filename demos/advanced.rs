//! Advanced features: custom managers, idle expiry, cancellation, reuse order

use async_trait::async_trait;
use esox_actorpool::{
    BoxError, Manager, ObjectPool, PoolConfiguration, PoolError, ReuseOrder,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug)]
struct Connection {
    id: usize,
    data: String,
}

struct ConnectionManager {
    next_id: AtomicUsize,
}

#[async_trait]
impl Manager for ConnectionManager {
    type Resource = Connection;

    async fn create(&self) -> Result<Connection, BoxError> {
        // Simulate a handshake
        sleep(Duration::from_millis(20)).await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        Ok(Connection {
            id,
            data: format!("Connection-{}", id),
        })
    }

    async fn close(&self, conn: Connection) -> Result<(), BoxError> {
        println!("   Closing {}", conn.data);
        Ok(())
    }
}

fn connections(config: PoolConfiguration) -> Result<ObjectPool<Connection>, PoolError> {
    ObjectPool::with_manager(
        ConnectionManager {
            next_id: AtomicUsize::new(1),
        },
        config,
    )
}

#[tokio::main]
async fn main() -> Result<(), PoolError> {
    println!("=== EsoxSolutions.ObjectPool (actor edition) - Advanced Features ===\n");

    // Example 1: Custom manager
    custom_manager().await?;

    // Example 2: Idle expiry
    idle_expiry().await?;

    // Example 3: Cancelled acquire
    cancelled_acquire().await?;

    // Example 4: Reuse order
    reuse_order().await?;

    Ok(())
}

async fn custom_manager() -> Result<(), PoolError> {
    println!("1. Custom Manager:");
    let pool = connections(PoolConfiguration::new().with_capacity(2))?;

    let data = pool
        .with_instance_async(|conn| {
            Box::pin(async move {
                sleep(Duration::from_millis(5)).await;
                Ok::<_, PoolError>(conn.data.clone())
            })
        })
        .await?;
    println!("   Used: {}", data);

    pool.dispose_pool().await;
    println!();
    Ok(())
}

async fn idle_expiry() -> Result<(), PoolError> {
    println!("2. Idle Expiry:");

    let config = PoolConfiguration::new().with_idle_timeout(Duration::from_millis(200));
    let pool = connections(config)?;

    {
        let conn = pool.acquire().await?;
        println!("   Got: {}", conn.data);
    }
    println!("   Idle after quick return: {}", pool.status().await?.idle);

    println!("   Waiting for idle timeout...");
    sleep(Duration::from_millis(300)).await;
    println!("   Idle after timeout: {}", pool.status().await?.idle);

    pool.dispose_pool().await;
    println!();
    Ok(())
}

async fn cancelled_acquire() -> Result<(), PoolError> {
    println!("3. Cancelled Acquire:");
    let pool = connections(PoolConfiguration::new())?;

    // The handshake takes longer than we are willing to wait
    let result = pool.acquire_timeout(Duration::from_millis(5)).await;
    println!("   First attempt: {:?}", result.map(|conn| conn.id));

    sleep(Duration::from_millis(50)).await;
    let conn = pool.acquire().await?;
    println!("   Second attempt reuses the late connection: {}", conn.data);
    drop(conn);

    pool.dispose_pool().await;
    println!();
    Ok(())
}

async fn reuse_order() -> Result<(), PoolError> {
    println!("4. Reuse Order:");

    for order in [ReuseOrder::Lifo, ReuseOrder::Fifo] {
        let pool = connections(PoolConfiguration::new().with_reuse_order(order))?;
        let a = pool.acquire().await?;
        let b = pool.acquire().await?;
        drop(a);
        drop(b);
        let next = pool.acquire().await?;
        println!("   {:?} hands out connection {}", order, next.id);
        drop(next);
        pool.dispose_pool().await;
    }

    Ok(())
}
