//! Basic usage examples for ObjectPool

use esox_actorpool::{ObjectPool, PoolConfiguration, PoolError};

#[tokio::main]
async fn main() -> Result<(), PoolError> {
    println!("=== EsoxSolutions.ObjectPool (actor edition) - Basic Examples ===\n");

    // Example 1: Simple pool with integers
    simple_pool().await?;

    // Example 2: Pool with configuration
    configured_pool().await?;

    // Example 3: Scoped use
    scoped_use().await?;

    // Example 4: Status
    status().await?;

    Ok(())
}

async fn simple_pool() -> Result<(), PoolError> {
    println!("1. Simple Pool:");
    let pool = ObjectPool::new(|| Ok::<_, PoolError>(42), PoolConfiguration::default())?;

    {
        let obj = pool.acquire().await?;
        println!("   Got object: {}", *obj);
        // Object automatically returned when dropped
    }

    println!("   Idle after return: {}\n", pool.status().await?.idle);
    pool.dispose_pool().await;
    Ok(())
}

async fn configured_pool() -> Result<(), PoolError> {
    println!("2. Configured Pool:");

    let config = PoolConfiguration::new()
        .with_capacity(5)
        .with_warmup(3);

    let pool = ObjectPool::new(|| Ok::<_, PoolError>(String::from("buffer")), config)?;

    {
        let _obj1 = pool.acquire().await?;
        let _obj2 = pool.acquire().await?;
        let status = pool.status().await?;
        println!("   Outstanding objects: {}", status.outstanding);
        println!("   Idle objects: {}", status.idle);
    }

    println!("   After return - Idle: {}\n", pool.status().await?.idle);
    pool.dispose_pool().await;
    Ok(())
}

async fn scoped_use() -> Result<(), PoolError> {
    println!("3. Scoped Use:");
    let pool = ObjectPool::new(|| Ok::<_, PoolError>(Vec::<u8>::new()), PoolConfiguration::default())?;

    let len = pool
        .with_instance(|buffer| {
            buffer.extend_from_slice(b"hello");
            Ok::<_, PoolError>(buffer.len())
        })
        .await?;
    println!("   Buffer length inside scope: {}", len);
    println!("   Outstanding after scope: {}\n", pool.status().await?.outstanding);

    pool.dispose_pool().await;
    Ok(())
}

async fn status() -> Result<(), PoolError> {
    println!("4. Status:");
    let pool = ObjectPool::new(
        || Ok::<_, PoolError>(0u64),
        PoolConfiguration::new().with_capacity(4),
    )?;

    {
        let _obj1 = pool.acquire().await?;
        let _obj2 = pool.acquire().await?;

        let status = pool.status().await?;
        println!("   State: {:?}", status.state);
        println!("   Utilization: {:.1}%", status.utilization * 100.0);
        println!("   Outstanding: {}, Idle: {}", status.outstanding, status.idle);
    }

    pool.dispose_pool().await;
    println!("   State after dispose: {:?}", pool.state());
    Ok(())
}
