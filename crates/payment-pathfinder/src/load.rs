//! Operational load tracking. Each pathfinding request holds a [`LoadEvent`]
//! for its lifetime; release happens on drop, on every exit path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

#[derive(Default)]
struct MonitorInner {
    active: AtomicUsize,
    completed: AtomicUsize,
}

/// Shared counter of in-flight and completed units of work.
#[derive(Clone, Default)]
pub struct LoadMonitor {
    inner: Arc<MonitorInner>,
}

impl LoadMonitor {
    pub fn new() -> Self {
        LoadMonitor::default()
    }

    /// Begin tracking one unit of work.
    pub fn track(&self, label: &'static str) -> LoadEvent {
        self.inner.active.fetch_add(1, Ordering::Relaxed);
        LoadEvent {
            inner: self.inner.clone(),
            label,
            started: Instant::now(),
        }
    }

    pub fn active(&self) -> usize {
        self.inner.active.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> usize {
        self.inner.completed.load(Ordering::Relaxed)
    }
}

/// RAII guard for one tracked unit of work.
pub struct LoadEvent {
    inner: Arc<MonitorInner>,
    label: &'static str,
    started: Instant,
}

impl Drop for LoadEvent {
    fn drop(&mut self) {
        self.inner.active.fetch_sub(1, Ordering::Relaxed);
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
        debug!(
            label = self.label,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "load event finished"
        );
    }
}
