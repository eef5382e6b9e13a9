//! Cooperative stop signalling shared by the sender and receiver loops.
//!
//! Each loop owns an `Arc<AtomicBool>` that is `true` while running.
//! Clearing it (from a Ctrl-C task, a test, or the window thread) makes
//! the loop wind down at its next suspension point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// How often a waiting loop re-checks the flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Resolves once `running` becomes false.
pub(crate) async fn wait_for_stop(running: &Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Sleep for `delay` unless stopped first. Returns `false` if stopped.
pub(crate) async fn sleep_or_stop(running: &Arc<AtomicBool>, delay: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => running.load(Ordering::SeqCst),
        _ = wait_for_stop(running) => false,
    }
}
