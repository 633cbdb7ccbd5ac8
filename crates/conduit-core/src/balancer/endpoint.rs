use parking_lot::RwLock;
use std::sync::Arc;

use crate::types::NodeKind;

/// Mutable health metrics of a single endpoint.
///
/// `last_block` is `0` before the first successful probe and `-1` when the
/// endpoint answered without a usable height. `last_response_time_ms` is `0`
/// before the first probe and is updated only when a response actually
/// arrived, so a timed-out endpoint keeps its last observed latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeMetrics {
    pub last_block: i64,
    pub last_response_time_ms: u64,
    pub failed: bool,
}

/// A registered upstream endpoint of one pool.
///
/// The URL and kind are immutable after registration; only the metrics
/// record mutates. Writers are the status probe (full record) and the
/// dispatcher (the `failed` flag alone). The record sits behind a lock so a
/// concurrent reader never observes a half-written update.
#[derive(Debug)]
pub struct NodeEndpoint {
    url: Arc<str>,
    kind: NodeKind,
    metrics: RwLock<NodeMetrics>,
}

/// A point-in-time copy of one endpoint's identity and metrics, as consumed
/// by the selection policy and the diagnostics surface.
#[derive(Debug, Clone)]
pub struct NodeSnapshot {
    pub index: usize,
    pub url: Arc<str>,
    pub kind: NodeKind,
    pub last_block: i64,
    pub last_response_time_ms: u64,
    pub failed: bool,
}

impl NodeEndpoint {
    #[must_use]
    pub fn new(url: impl AsRef<str>, kind: NodeKind) -> Self {
        Self { url: Arc::from(url.as_ref()), kind, metrics: RwLock::new(NodeMetrics::default()) }
    }

    #[must_use]
    pub fn url(&self) -> &Arc<str> {
        &self.url
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns a consistent copy of the current metrics.
    #[must_use]
    pub fn metrics(&self) -> NodeMetrics {
        *self.metrics.read()
    }

    /// Builds a selection-policy snapshot for this endpoint at `index`.
    #[must_use]
    pub fn snapshot(&self, index: usize) -> NodeSnapshot {
        let metrics = self.metrics();
        NodeSnapshot {
            index,
            url: Arc::clone(&self.url),
            kind: self.kind,
            last_block: metrics.last_block,
            last_response_time_ms: metrics.last_response_time_ms,
            failed: metrics.failed,
        }
    }

    /// Records a successful probe: clears the failure flag and stores the
    /// observed height and round-trip time in one write.
    pub fn record_probe_success(&self, block: i64, response_time_ms: u64) {
        let mut metrics = self.metrics.write();
        metrics.failed = false;
        metrics.last_block = block;
        metrics.last_response_time_ms = response_time_ms;
    }

    /// Records a failed probe. The round-trip time is stored only when the
    /// endpoint actually answered (`response_time_ms` is `Some`).
    pub fn record_probe_failure(&self, response_time_ms: Option<u64>) {
        let mut metrics = self.metrics.write();
        metrics.failed = true;
        if let Some(elapsed) = response_time_ms {
            metrics.last_response_time_ms = elapsed;
        }
    }

    /// Flips the failure flag without touching the probe metrics.
    ///
    /// This is the dispatcher's only write; height and latency stay owned by
    /// the probe.
    pub fn mark_failed(&self) {
        self.metrics.write().failed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_endpoint_defaults() {
        let endpoint = NodeEndpoint::new("https://eth.rpc.example", NodeKind::Normal);
        let metrics = endpoint.metrics();
        assert_eq!(metrics.last_block, 0);
        assert_eq!(metrics.last_response_time_ms, 0);
        assert!(!metrics.failed);
    }

    #[test]
    fn test_probe_success_clears_failure() {
        let endpoint = NodeEndpoint::new("https://eth.rpc.example", NodeKind::Normal);
        endpoint.mark_failed();
        assert!(endpoint.metrics().failed);

        endpoint.record_probe_success(120, 45);
        let metrics = endpoint.metrics();
        assert!(!metrics.failed);
        assert_eq!(metrics.last_block, 120);
        assert_eq!(metrics.last_response_time_ms, 45);
    }

    #[test]
    fn test_probe_failure_keeps_latency_without_response() {
        let endpoint = NodeEndpoint::new("https://eth.rpc.example", NodeKind::Archive);
        endpoint.record_probe_success(100, 30);

        endpoint.record_probe_failure(None);
        let metrics = endpoint.metrics();
        assert!(metrics.failed);
        assert_eq!(metrics.last_response_time_ms, 30, "timeout must not clobber latency");
        assert_eq!(metrics.last_block, 100);
    }

    #[test]
    fn test_probe_failure_updates_latency_when_answered() {
        let endpoint = NodeEndpoint::new("https://eth.rpc.example", NodeKind::Archive);
        endpoint.record_probe_success(100, 30);

        endpoint.record_probe_failure(Some(800));
        assert_eq!(endpoint.metrics().last_response_time_ms, 800);
    }

    #[test]
    fn test_mark_failed_preserves_probe_metrics() {
        let endpoint = NodeEndpoint::new("https://eth.rpc.example", NodeKind::Normal);
        endpoint.record_probe_success(250, 12);

        endpoint.mark_failed();
        let metrics = endpoint.metrics();
        assert!(metrics.failed);
        assert_eq!(metrics.last_block, 250);
        assert_eq!(metrics.last_response_time_ms, 12);
    }

    #[test]
    fn test_snapshot_copies_identity_and_metrics() {
        let endpoint = NodeEndpoint::new("https://btc.rpc.example", NodeKind::Archive);
        endpoint.record_probe_success(900_000, 77);

        let snapshot = endpoint.snapshot(3);
        assert_eq!(snapshot.index, 3);
        assert_eq!(snapshot.url.as_ref(), "https://btc.rpc.example");
        assert_eq!(snapshot.kind, NodeKind::Archive);
        assert_eq!(snapshot.last_block, 900_000);
        assert_eq!(snapshot.last_response_time_ms, 77);
        assert!(!snapshot.failed);
    }
}
