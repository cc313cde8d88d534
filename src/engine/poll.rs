//! Completion polling.
//!
//! The host offers no future for "this background job is done"; completion is
//! inferred by re-checking observable state at a fixed interval, or by waiting
//! for a single host notification. Every awaited condition in the engine goes
//! through one of these three primitives, so a timeout or cancellation policy
//! could later be added in one place.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tokio::time::sleep;

use crate::host::HostEnv;

/// General-purpose re-check interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
/// Freeing a fluid cache settles fast, so it is polled tighter.
pub const FLUID_FREE_INTERVAL: Duration = Duration::from_millis(200);

/// Resolve once `check` returns true, re-evaluating every `interval`.
///
/// The first evaluation happens immediately. There is no timeout and no retry
/// cap: a condition that never becomes true polls forever and has to be
/// cancelled from outside, e.g. by dropping the task.
pub async fn await_interval<F>(mut check: F, interval: Duration)
where
    F: FnMut() -> bool,
{
    loop {
        if check() {
            return;
        }
        sleep(interval).await;
    }
}

/// Resolve once `path` has a modification time at or after the moment this
/// call was made. A missing or unreadable file counts as "not yet written",
/// never as an error.
pub async fn await_file_write(path: &Path, interval: Duration) {
    let registered = SystemTime::now();

    await_interval(
        || {
            std::fs::metadata(path)
                .and_then(|meta| meta.modified())
                .map(|mtime| mtime >= registered)
                .unwrap_or(false)
        },
        interval,
    )
    .await;
}

/// Resolve on the next "state refreshed" notification from the host.
/// Fires at most once per call.
pub async fn await_refresh(env: &dyn HostEnv) {
    let notify = env.refresh_notify();
    notify.notified().await;
}
