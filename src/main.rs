//! safecache demo
//!
//! Memoizes a deliberately slow computation and reports cache statistics.
//!
//! ```text
//! SAFECACHE_MAXSIZE=2 SAFECACHE_TTL=5 RUST_LOG=safecache=debug safecache 27 97 871
//! ```

use std::env;
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use safecache::{CacheConfig, SafeCache};

#[derive(Debug, thiserror::Error)]
#[error("collatz sequence starting at {0} overflows u64")]
struct Overflow(u64);

/// Number of steps for `start` to reach 1 under the Collatz map.
fn collatz_steps(start: &u64) -> std::result::Result<u64, Overflow> {
    // Stand-in for an expensive upstream call.
    sleep(Duration::from_millis(200));

    let mut n = (*start).max(1);
    let mut steps = 0;
    while n != 1 {
        n = if n % 2 == 0 {
            n / 2
        } else {
            n.checked_mul(3)
                .and_then(|n| n.checked_add(1))
                .ok_or(Overflow(*start))?
        };
        steps += 1;
    }
    Ok(steps)
}

/// Entry point for the safecache demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Wrap the computation in a cache
/// 4. Evaluate every argument twice, timing each call
/// 5. Log the cache statistics
fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "safecache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = CacheConfig::from_env();
    info!(
        "Configuration loaded: maxsize={:?}, ttl={:?}",
        config.maxsize, config.ttl
    );

    let cache = SafeCache::from_config(&config, collatz_steps);

    let inputs = env::args()
        .skip(1)
        .map(|arg| {
            arg.parse::<u64>()
                .with_context(|| format!("invalid number: {arg}"))
        })
        .collect::<Result<Vec<_>>>()?;
    let inputs = if inputs.is_empty() {
        vec![27, 97, 871]
    } else {
        inputs
    };

    for round in 1..=2 {
        for n in &inputs {
            let started = Instant::now();
            let steps = cache.call(n)?;
            info!(
                "round {}: collatz({}) = {} steps in {:?}",
                round,
                n,
                *steps,
                started.elapsed()
            );
        }
    }

    info!("{}", cache.cache_info());
    Ok(())
}
