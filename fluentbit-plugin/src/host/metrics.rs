//! Counter/metric factory capability.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Namespace under which all plugin counters are registered.
pub const METRICS_NAMESPACE: &str = "fluentbit";
/// Subsystem under which all plugin counters are registered.
pub const METRICS_SUBSYSTEM: &str = "plugin";

/// A monotonically increasing counter.
pub trait Counter: Send + Sync {
    fn add(&self, delta: u64);

    fn inc(&self) {
        self.add(1);
    }
}

/// Factory for counters, scoped by namespace and subsystem.
pub trait Metrics: Send + Sync {
    /// Create (or fetch) the counter `name` labeled with the plugin name.
    fn counter(&self, name: &str, description: &str, plugin: &str) -> Arc<dyn Counter>;
}

/// In-process metrics registry used when no host metrics context is
/// available. Counters are plain atomics addressable by full name, which
/// also makes them convenient to assert on in tests.
pub struct InProcessMetrics {
    namespace: String,
    subsystem: String,
    counters: Mutex<BTreeMap<String, Arc<AtomicCounter>>>,
}

impl InProcessMetrics {
    pub fn new(namespace: &str, subsystem: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            subsystem: subsystem.to_string(),
            counters: Mutex::new(BTreeMap::new()),
        }
    }

    /// Current value of a counter, or zero if it was never created.
    pub fn value(&self, name: &str, plugin: &str) -> u64 {
        let key = self.key(name, plugin);
        let counters = self
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        counters.get(&key).map(|c| c.value()).unwrap_or_default()
    }

    fn key(&self, name: &str, plugin: &str) -> String {
        format!(
            "{}_{}_{}:{}",
            self.namespace, self.subsystem, name, plugin
        )
    }
}

impl Default for InProcessMetrics {
    fn default() -> Self {
        Self::new(METRICS_NAMESPACE, METRICS_SUBSYSTEM)
    }
}

impl Metrics for InProcessMetrics {
    fn counter(&self, name: &str, _description: &str, plugin: &str) -> Arc<dyn Counter> {
        let key = self.key(name, plugin);
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        counters
            .entry(key)
            .or_insert_with(|| Arc::new(AtomicCounter::default()))
            .clone()
    }
}

#[derive(Default)]
pub struct AtomicCounter(AtomicU64);

impl AtomicCounter {
    pub fn value(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Counter for AtomicCounter {
    fn add(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }
}
