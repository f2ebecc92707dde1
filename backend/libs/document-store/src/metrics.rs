//! Store metrics for observability

use prometheus::{CounterVec, IntCounter, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<StoreMetricsInner> = OnceLock::new();

struct StoreMetricsInner {
    commits: CounterVec,
    writes: CounterVec,
    snapshots: IntCounter,
}

impl StoreMetricsInner {
    fn new() -> Self {
        Self {
            commits: CounterVec::new(
                Opts::new("sphere_store_commits_total", "Total batch commits"),
                &["outcome"],
            )
            .expect("valid metric definition"),
            writes: CounterVec::new(
                Opts::new("sphere_store_writes_total", "Total committed writes"),
                &["collection", "kind"],
            )
            .expect("valid metric definition"),
            snapshots: IntCounter::new(
                "sphere_store_snapshots_total",
                "Total snapshots delivered to live subscriptions",
            )
            .expect("valid metric definition"),
        }
    }

    fn register(&self, registry: &Registry) -> Result<(), prometheus::Error> {
        registry.register(Box::new(self.commits.clone()))?;
        registry.register(Box::new(self.writes.clone()))?;
        registry.register(Box::new(self.snapshots.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static StoreMetricsInner {
    METRICS.get_or_init(StoreMetricsInner::new)
}

/// Top-level collection of a path, used as metric label
fn extract_collection(path: &str) -> &str {
    path.split('/').next().unwrap_or("unknown")
}

#[derive(Clone, Default)]
pub struct StoreMetrics;

impl StoreMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Register metrics with a Prometheus registry
    pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
        get_metrics().register(registry)
    }

    pub fn record_commit(&self, outcome: &str) {
        get_metrics().commits.with_label_values(&[outcome]).inc();
    }

    pub fn record_write(&self, path: &str, kind: &str) {
        let collection = extract_collection(path);
        get_metrics()
            .writes
            .with_label_values(&[collection, kind])
            .inc();
    }

    pub fn record_snapshot(&self) {
        get_metrics().snapshots.inc();
    }
}
