//! Basic usage examples for ObjectPool

use common_objectpool::{BoxError, ObjectPool, PoolConfiguration, ResourceFactory};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Stand-in for an expensive connection
#[derive(Debug)]
struct Session {
    number: u32,
}

struct SessionFactory {
    opened: AtomicU32,
}

impl ResourceFactory<Session> for SessionFactory {
    fn create(&self) -> Result<Session, BoxError> {
        let number = self.opened.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Session { number })
    }

    fn is_valid(&self, session: &Session) -> bool {
        session.number % 5 != 0
    }
}

fn main() -> Result<(), BoxError> {
    println!("=== common_objectpool - Basic Examples ===\n");

    let config = PoolConfiguration::new()
        .with_min_idle(2)
        .with_max_idle(4)
        .with_max_active(4)
        .with_idle_check_interval(Duration::from_millis(200));
    let pool = ObjectPool::new(SessionFactory { opened: AtomicU32::new(0) }, config)?;

    // Example 1: Borrow and return
    println!("1. Borrow and return:");
    {
        let session = pool.borrow()?;
        println!("   Got session #{}", session.number);
        // Session automatically returned when dropped
    }
    println!("   Idle after return: {}\n", pool.idle_count());

    // Example 2: Capacity limit
    println!("2. Capacity limit:");
    let held: Vec<_> = (0..4).filter_map(|_| pool.try_borrow()).collect();
    match pool.borrow() {
        Ok(_) => println!("   Unexpected fifth session"),
        Err(e) => println!("   {e}"),
    }
    drop(held);

    // Example 3: Invalidate a broken session
    println!("\n3. Invalidate:");
    let session = pool.borrow()?;
    println!("   Dropping session #{} for good", session.number);
    pool.invalidate(session);

    // Example 4: Eviction keeps min_idle in reserve
    println!("\n4. Eviction:");
    std::thread::sleep(Duration::from_millis(500));
    let status = pool.status();
    println!("   Eviction task: {} ({})", status.eviction_state, status.eviction_message);
    println!("   Active: {}, Idle: {}", status.active_count, status.idle_count);

    // Example 5: Metrics and health
    println!("\n5. Metrics and health:");
    let health = pool.get_health_status();
    println!("   Health: {}", if health.is_healthy { "Healthy" } else { "Unhealthy" });
    for (key, value) in pool.export_metrics() {
        println!("     {}: {}", key, value);
    }

    Ok(())
}
