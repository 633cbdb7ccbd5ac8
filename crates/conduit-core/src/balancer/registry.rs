use arc_swap::{ArcSwap, ArcSwapOption};
use std::sync::Arc;

use crate::types::NodeKind;

use super::endpoint::{NodeEndpoint, NodeSnapshot};

/// The currently selected endpoint of one pool.
///
/// Swapped atomically as a whole, so a reader never observes a URL paired
/// with a foreign index.
#[derive(Debug, Clone)]
pub struct ActiveNode {
    pub url: Arc<str>,
    pub index: usize,
}

/// Holds the two endpoint pools and their active selections.
///
/// Pool contents are fixed once bootstrap populates them; afterwards only
/// per-endpoint metrics and the active pairs mutate. Reads of the pool
/// vectors are lock-free via `ArcSwap`, matching how the rest of the crate
/// treats the registry as a read-mostly structure.
pub struct EndpointRegistry {
    pools: [ArcSwap<Vec<Arc<NodeEndpoint>>>; 2],
    actives: [ArcSwapOption<ActiveNode>; 2],
}

const fn pool_index(kind: NodeKind) -> usize {
    match kind {
        NodeKind::Normal => 0,
        NodeKind::Archive => 1,
    }
}

impl EndpointRegistry {
    /// Creates an empty registry. Bootstrap populates it exactly once.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pools: [ArcSwap::from_pointee(Vec::new()), ArcSwap::from_pointee(Vec::new())],
            actives: [ArcSwapOption::const_empty(), ArcSwapOption::const_empty()],
        }
    }

    /// Installs the endpoint list for `kind`. Bootstrap-only.
    pub(crate) fn set_endpoints(&self, kind: NodeKind, endpoints: Vec<Arc<NodeEndpoint>>) {
        self.pools[pool_index(kind)].store(Arc::new(endpoints));
    }

    /// Returns the pool for `kind` (cheap `Arc` snapshot of the list).
    #[must_use]
    pub fn endpoints(&self, kind: NodeKind) -> Arc<Vec<Arc<NodeEndpoint>>> {
        self.pools[pool_index(kind)].load_full()
    }

    /// Total endpoints registered across both kinds.
    #[must_use]
    pub fn total_endpoints(&self) -> usize {
        NodeKind::ALL.iter().map(|kind| self.endpoints(*kind).len()).sum()
    }

    /// Whether no endpoint is registered in either pool.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_endpoints() == 0
    }

    /// Returns the active selection for `kind`, if any.
    #[must_use]
    pub fn active(&self, kind: NodeKind) -> Option<Arc<ActiveNode>> {
        self.actives[pool_index(kind)].load_full()
    }

    /// Atomically publishes a new active selection for `kind`.
    ///
    /// Debug builds assert the registry invariant that the pair points at a
    /// pool entry with the same URL.
    pub fn set_active(&self, kind: NodeKind, active: ActiveNode) {
        debug_assert!(
            self.endpoints(kind)
                .get(active.index)
                .is_some_and(|endpoint| *endpoint.url() == active.url),
            "active pair must reference a matching pool entry"
        );
        self.actives[pool_index(kind)].store(Some(Arc::new(active)));
    }

    /// Clears the active selection for `kind`.
    pub fn clear_active(&self, kind: NodeKind) {
        self.actives[pool_index(kind)].store(None);
    }

    /// Resolves the endpoint for the next call.
    ///
    /// Tries the requested kind first and falls back to the other pool, per
    /// the resolver contract. Returns the kind actually used alongside the
    /// active pair, so a failing call penalizes the right pool.
    #[must_use]
    pub fn resolve_active(&self, prefer_archive: bool) -> Option<(NodeKind, Arc<ActiveNode>)> {
        let order = if prefer_archive {
            [NodeKind::Archive, NodeKind::Normal]
        } else {
            [NodeKind::Normal, NodeKind::Archive]
        };

        order
            .into_iter()
            .find_map(|kind| self.active(kind).map(|active| (kind, active)))
    }

    /// Takes consistent per-endpoint snapshots of one pool, in list order.
    #[must_use]
    pub fn snapshots(&self, kind: NodeKind) -> Vec<NodeSnapshot> {
        self.endpoints(kind)
            .iter()
            .enumerate()
            .map(|(index, endpoint)| endpoint.snapshot(index))
            .collect()
    }

    /// Flips the failure flag of `endpoints[kind][index]`, if it exists.
    pub fn mark_failed(&self, kind: NodeKind, index: usize) {
        if let Some(endpoint) = self.endpoints(kind).get(index) {
            endpoint.mark_failed();
        }
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(url: &str, kind: NodeKind) -> Arc<NodeEndpoint> {
        Arc::new(NodeEndpoint::new(url, kind))
    }

    fn seeded_registry() -> EndpointRegistry {
        let registry = EndpointRegistry::new();
        registry.set_endpoints(
            NodeKind::Normal,
            vec![endpoint("https://a.rpc.example", NodeKind::Normal)],
        );
        registry.set_endpoints(
            NodeKind::Archive,
            vec![endpoint("https://x.rpc.example", NodeKind::Archive)],
        );
        registry
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = EndpointRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.active(NodeKind::Normal).is_none());
        assert!(registry.active(NodeKind::Archive).is_none());
        assert!(registry.resolve_active(false).is_none());
    }

    #[test]
    fn test_active_pair_consistency() {
        let registry = seeded_registry();
        registry
            .set_active(NodeKind::Normal, ActiveNode { url: Arc::from("https://a.rpc.example"), index: 0 });

        let active = registry.active(NodeKind::Normal).unwrap();
        let pool = registry.endpoints(NodeKind::Normal);
        assert_eq!(*pool[active.index].url(), active.url);
    }

    #[test]
    fn test_resolver_prefers_requested_kind() {
        let registry = seeded_registry();
        registry
            .set_active(NodeKind::Normal, ActiveNode { url: Arc::from("https://a.rpc.example"), index: 0 });
        registry
            .set_active(NodeKind::Archive, ActiveNode { url: Arc::from("https://x.rpc.example"), index: 0 });

        let (kind, active) = registry.resolve_active(false).unwrap();
        assert_eq!(kind, NodeKind::Normal);
        assert_eq!(active.url.as_ref(), "https://a.rpc.example");

        let (kind, active) = registry.resolve_active(true).unwrap();
        assert_eq!(kind, NodeKind::Archive);
        assert_eq!(active.url.as_ref(), "https://x.rpc.example");
    }

    #[test]
    fn test_resolver_falls_back_to_other_kind() {
        let registry = seeded_registry();
        registry
            .set_active(NodeKind::Archive, ActiveNode { url: Arc::from("https://x.rpc.example"), index: 0 });

        // Normal pool has no active; a normal request lands on archive.
        let (kind, active) = registry.resolve_active(false).unwrap();
        assert_eq!(kind, NodeKind::Archive);
        assert_eq!(active.url.as_ref(), "https://x.rpc.example");
    }

    #[test]
    fn test_resolver_empty_both() {
        let registry = seeded_registry();
        assert!(registry.resolve_active(false).is_none());
        assert!(registry.resolve_active(true).is_none());
    }

    #[test]
    fn test_clear_active() {
        let registry = seeded_registry();
        registry
            .set_active(NodeKind::Normal, ActiveNode { url: Arc::from("https://a.rpc.example"), index: 0 });
        registry.clear_active(NodeKind::Normal);
        assert!(registry.active(NodeKind::Normal).is_none());
    }

    #[test]
    fn test_snapshots_preserve_list_order() {
        let registry = EndpointRegistry::new();
        registry.set_endpoints(
            NodeKind::Normal,
            vec![
                endpoint("https://a.rpc.example", NodeKind::Normal),
                endpoint("https://b.rpc.example", NodeKind::Normal),
                endpoint("https://c.rpc.example", NodeKind::Normal),
            ],
        );

        let snapshots = registry.snapshots(NodeKind::Normal);
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].url.as_ref(), "https://a.rpc.example");
        assert_eq!(snapshots[1].index, 1);
        assert_eq!(snapshots[2].url.as_ref(), "https://c.rpc.example");
    }

    #[test]
    fn test_mark_failed_by_index() {
        let registry = seeded_registry();
        registry.mark_failed(NodeKind::Normal, 0);
        assert!(registry.snapshots(NodeKind::Normal)[0].failed);

        // Out-of-range index is a no-op.
        registry.mark_failed(NodeKind::Normal, 99);
    }

    #[test]
    fn test_same_url_in_both_kinds_is_independent_state() {
        let registry = EndpointRegistry::new();
        registry
            .set_endpoints(NodeKind::Normal, vec![endpoint("https://dual.rpc.example", NodeKind::Normal)]);
        registry.set_endpoints(
            NodeKind::Archive,
            vec![endpoint("https://dual.rpc.example", NodeKind::Archive)],
        );

        registry.mark_failed(NodeKind::Normal, 0);
        assert!(registry.snapshots(NodeKind::Normal)[0].failed);
        assert!(!registry.snapshots(NodeKind::Archive)[0].failed);
    }
}
