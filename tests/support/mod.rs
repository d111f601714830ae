// ABOUTME: Test support utilities.
// ABOUTME: Tracing init, engine detection, and unique fixture names.

use std::sync::Once;
use std::sync::atomic::{AtomicU32, Ordering};

use skafos::engine::Engine;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("skafos=debug".parse().unwrap());
        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

/// Engine to test against, if any daemon answers.
#[allow(dead_code)]
pub async fn local_engine() -> Option<Engine> {
    Engine::detect().await.ok()
}

static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Unique per-process fixture suffix so parallel test runs don't collide
/// on engine-side names.
#[allow(dead_code)]
pub fn unique_suffix() -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}", std::process::id(), n)
}
