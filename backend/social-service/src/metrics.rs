//! Social metrics for observability

use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

static METRICS: OnceLock<SocialMetricsInner> = OnceLock::new();

struct SocialMetricsInner {
    graph_mutations: IntCounterVec,
    engagements: IntCounterVec,
}

impl SocialMetricsInner {
    fn new() -> Self {
        Self {
            graph_mutations: IntCounterVec::new(
                Opts::new(
                    "sphere_graph_mutations_total",
                    "Follow graph mutations by action and result",
                ),
                &["action", "result"],
            )
            .expect("valid metric definition"),
            engagements: IntCounterVec::new(
                Opts::new("sphere_engagements_total", "Posts, comments and likes written"),
                &["kind"],
            )
            .expect("valid metric definition"),
        }
    }
}

fn get_metrics() -> &'static SocialMetricsInner {
    METRICS.get_or_init(SocialMetricsInner::new)
}

/// Register metrics with a Prometheus registry
pub fn register(registry: &Registry) -> Result<(), prometheus::Error> {
    let m = get_metrics();
    registry.register(Box::new(m.graph_mutations.clone()))?;
    registry.register(Box::new(m.engagements.clone()))?;
    Ok(())
}

/// `result` is `applied`, `noop` or `failed`
pub(crate) fn record_graph(action: &str, result: &str) {
    get_metrics()
        .graph_mutations
        .with_label_values(&[action, result])
        .inc();
}

pub(crate) fn record_engagement(kind: &str) {
    get_metrics().engagements.with_label_values(&[kind]).inc();
}
