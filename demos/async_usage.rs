//! Async usage examples

use esox_actorpool::{ObjectPool, PoolConfiguration, PoolError};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), PoolError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("esox_actorpool=debug")),
        )
        .init();

    println!("=== EsoxSolutions.ObjectPool (actor edition) - Async Examples ===\n");

    // Example 1: Waiting for a returned object
    waiting_acquire().await?;

    // Example 2: Acquire with timeout
    acquire_with_timeout().await?;

    // Example 3: Concurrent access
    concurrent_access().await?;

    // Example 4: Graceful disposal
    graceful_dispose().await?;

    Ok(())
}

async fn waiting_acquire() -> Result<(), PoolError> {
    println!("1. Waiting Acquire:");
    let pool = ObjectPool::new(|| Ok::<_, PoolError>(1), PoolConfiguration::new().with_capacity(1))?;

    let obj = pool.acquire().await?;
    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.acquire().await.map(|obj| *obj) })
    };

    sleep(Duration::from_millis(50)).await;
    println!("   Waiter finished while object held: {}", waiter.is_finished());
    drop(obj);
    println!("   Waiter got: {:?}\n", waiter.await);

    pool.dispose_pool().await;
    Ok(())
}

async fn acquire_with_timeout() -> Result<(), PoolError> {
    println!("2. Acquire with Timeout:");

    let config = PoolConfiguration::new()
        .with_capacity(1)
        .with_timeout(Duration::from_millis(100));

    let pool = ObjectPool::new(|| Ok::<_, PoolError>(42), config)?;

    // Get the only object
    let _obj = pool.acquire().await?;

    // Try to get another (should time out)
    match pool.acquire().await {
        Ok(_) => println!("   Got object"),
        Err(e) => println!("   Error: {}", e),
    }

    println!();
    Ok(())
}

async fn concurrent_access() -> Result<(), PoolError> {
    println!("3. Concurrent Access:");

    let pool = ObjectPool::new(
        || {
            println!("   Creating new object...");
            Ok::<_, PoolError>(0usize)
        },
        PoolConfiguration::new().with_capacity(3),
    )?;

    let mut handles = vec![];
    for i in 0..10 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            let mut obj = pool.acquire().await?;
            *obj += 1;
            sleep(Duration::from_millis(10)).await;
            println!("   Task {} used object {} (uses: {})", i, obj.id(), *obj);
            Ok::<_, PoolError>(())
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    let status = pool.status().await?;
    println!("   Objects kept: {}\n", status.idle);
    pool.dispose_pool().await;
    Ok(())
}

async fn graceful_dispose() -> Result<(), PoolError> {
    println!("4. Graceful Dispose:");

    let pool = ObjectPool::new(|| Ok::<_, PoolError>("session"), PoolConfiguration::default())?;
    let obj = pool.acquire().await?;

    let disposer = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.dispose_pool().await })
    };

    sleep(Duration::from_millis(50)).await;
    println!("   State while object held: {:?}", pool.state());
    drop(obj);
    let _ = disposer.await;
    println!("   State after return: {:?}", pool.state());
    Ok(())
}
