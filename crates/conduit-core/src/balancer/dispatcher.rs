//! The balancer facade: lifecycle, dispatch, and failover.
//!
//! [`RpcBalancer`] ties the registry, probe, scheduler, and HTTP transport
//! together. Client calls resolve the active endpoint (requested pool first,
//! falling back to the other), POST the JSON-RPC envelope, and on a
//! transport-level failure mark the endpoint, re-run selection on that pool,
//! and retry. The retry is a bounded loop (the bound is the total endpoint
//! count across both pools), preserving the contract that rotation continues
//! until the pool in use is exhausted.

use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    config::BalancerConfig,
    network::Network,
    types::{JsonRpcRequest, JsonRpcResponse, NodeKind},
};

use super::{
    bootstrap,
    endpoint::NodeSnapshot,
    errors::BalancerError,
    http::HttpClient,
    probe::StatusProbe,
    registry::{ActiveNode, EndpointRegistry},
    scheduler::Scheduler,
    selection,
};

/// Per-pool counters for the diagnostics surface.
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Endpoints registered in this pool.
    pub total: usize,
    /// Endpoints currently flagged as failed.
    pub failed: usize,
    /// URL of the pool's active endpoint, if one is selected.
    pub active_url: Option<Arc<str>>,
}

/// Snapshot of both pools, mirroring what the selection policy sees.
#[derive(Debug, Clone)]
pub struct BalancerStats {
    pub normal: PoolStats,
    pub archive: PoolStats,
}

/// Load-balanced JSON-RPC dispatcher for one network.
///
/// Construct with [`RpcBalancer::new`], populate with [`RpcBalancer::init`]
/// (exactly once), and tear down with [`RpcBalancer::destroy`]; dropping
/// the balancer cancels the probe loop as well. Instances share nothing;
/// an SDK embedding several balancers gets fully independent state.
pub struct RpcBalancer {
    config: BalancerConfig,
    http: Arc<HttpClient>,
    registry: Arc<EndpointRegistry>,
    probe: Arc<StatusProbe>,
    scheduler: Scheduler,
    initialized: AtomicBool,
}

impl RpcBalancer {
    /// Creates an uninitialized balancer for `config.network`.
    ///
    /// # Errors
    ///
    /// Returns [`BalancerError::UnsupportedNetwork`] for networks whose
    /// family has no status payload codec; those must be served through
    /// their own HTTP surfaces, never through the balancer.
    pub fn new(config: BalancerConfig) -> Result<Self, BalancerError> {
        if !config.network.supports_load_balancing() {
            return Err(BalancerError::UnsupportedNetwork(config.network));
        }

        let http = Arc::new(HttpClient::new(&config)?);
        let probe = Arc::new(StatusProbe::new(Arc::clone(&http), config.clone()));

        Ok(Self {
            config,
            http,
            registry: Arc::new(EndpointRegistry::new()),
            probe,
            scheduler: Scheduler::new(),
            initialized: AtomicBool::new(false),
        })
    }

    /// Populates the registry and arms load balancing.
    ///
    /// In periodic mode the first probe pass runs one poll interval after
    /// `init` returns; until then calls go to the randomly chosen initial
    /// actives. In one-shot mode a single pass runs here and no timer is
    /// installed.
    ///
    /// # Errors
    ///
    /// Returns [`BalancerError::InvalidRequest`] on a second `init`, and in
    /// one-shot mode propagates [`BalancerError::NoActiveNode`] when the
    /// pass leaves neither pool with a usable endpoint.
    pub async fn init(&self) -> Result<(), BalancerError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(BalancerError::InvalidRequest(
                "balancer is already initialized".to_string(),
            ));
        }

        bootstrap::populate_registry(&self.http, &self.config, &self.registry).await?;

        if self.config.one_time_load_balancing {
            self.probe.run_pass(&self.registry).await?;
        } else {
            self.scheduler.start(
                self.config.poll_interval,
                Arc::clone(&self.probe),
                Arc::clone(&self.registry),
            );
        }

        Ok(())
    }

    /// Cancels the periodic probe loop. Idempotent.
    ///
    /// In-flight probe requests are not aborted; they settle on their own
    /// and their writes land in a registry nothing schedules against.
    pub fn destroy(&self) {
        self.scheduler.stop();
    }

    /// Network this balancer serves.
    #[must_use]
    pub fn network(&self) -> Network {
        self.config.network
    }

    /// Sends a JSON-RPC call through the balancer.
    ///
    /// With `archive` set the resolver tries the archive pool first; either
    /// way it falls back to the other pool when the requested one has no
    /// active endpoint. The response is returned uninterpreted; a JSON-RPC
    /// `error` member is the caller's to inspect.
    ///
    /// # Errors
    ///
    /// - [`BalancerError::NoActiveNode`] when neither pool has an active
    ///   endpoint.
    /// - [`BalancerError::AllNodesUnavailable`] when failover exhausts the
    ///   pool in use; the last transport error is attached.
    pub async fn raw_rpc_call(
        &self,
        request: &JsonRpcRequest,
        archive: bool,
    ) -> Result<JsonRpcResponse, BalancerError> {
        let body = encode_body(request)?;
        self.dispatch(body, archive).await
    }

    /// Sends a JSON-RPC batch through the balancer.
    ///
    /// Batches always resolve archive-first: a batch may reference
    /// historical state, so the archive pool is preferred even when the
    /// caller did not ask for archive semantics.
    ///
    /// # Errors
    ///
    /// Same as [`RpcBalancer::raw_rpc_call`].
    pub async fn raw_batch_rpc_call(
        &self,
        requests: &[JsonRpcRequest],
    ) -> Result<Vec<JsonRpcResponse>, BalancerError> {
        let body = encode_body(requests)?;
        self.dispatch(body, true).await
    }

    /// POSTs `body` to `path` on the active normal endpoint.
    ///
    /// Used by non-RPC chain surfaces (Tron HTTP API, Solana REST). No
    /// failover: an error is logged and propagated.
    ///
    /// # Errors
    ///
    /// [`BalancerError::NoActiveNode`] when the normal pool has no active
    /// endpoint; otherwise the transport error of the single attempt.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, BalancerError> {
        let active = self.registry.active(NodeKind::Normal).ok_or(BalancerError::NoActiveNode)?;
        let url = format!("{}{}", active.url.trim_end_matches('/'), path);

        let payload = serde_json::to_vec(body)
            .map_err(|e| BalancerError::InvalidRequest(format!("request body: {e}")))?;

        let bytes = self
            .http
            .post_json(&url, Bytes::from(payload), None)
            .await
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "http post failed");
                e
            })?;

        serde_json::from_slice(&bytes)
            .map_err(|e| BalancerError::InvalidResponse(format!("response body: {e}")))
    }

    /// URL of the active normal endpoint, if any.
    #[must_use]
    pub fn active_normal_url(&self) -> Option<Arc<str>> {
        self.registry.active(NodeKind::Normal).map(|active| Arc::clone(&active.url))
    }

    /// URL of the active archive endpoint, if any.
    #[must_use]
    pub fn active_archive_url(&self) -> Option<Arc<str>> {
        self.registry.active(NodeKind::Archive).map(|active| Arc::clone(&active.url))
    }

    /// Diagnostic snapshots of one pool, in registration order.
    #[must_use]
    pub fn node_snapshots(&self, kind: NodeKind) -> Vec<NodeSnapshot> {
        self.registry.snapshots(kind)
    }

    /// Current pool counters and active URLs.
    #[must_use]
    pub fn stats(&self) -> BalancerStats {
        let pool_stats = |kind: NodeKind| {
            let snapshots = self.registry.snapshots(kind);
            PoolStats {
                total: snapshots.len(),
                failed: snapshots.iter().filter(|snapshot| snapshot.failed).count(),
                active_url: self.registry.active(kind).map(|active| Arc::clone(&active.url)),
            }
        };

        BalancerStats { normal: pool_stats(NodeKind::Normal), archive: pool_stats(NodeKind::Archive) }
    }

    /// Resolve, send, and rotate until a response decodes or the pool in
    /// use runs dry.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        body: Bytes,
        prefer_archive: bool,
    ) -> Result<T, BalancerError> {
        let attempt_limit = self.registry.total_endpoints();
        let mut attempts = 0usize;

        loop {
            let (kind, active) =
                self.registry.resolve_active(prefer_archive).ok_or(BalancerError::NoActiveNode)?;

            let error = match self.http.post_json(&active.url, body.clone(), None).await {
                Ok(bytes) => match serde_json::from_slice::<T>(&bytes) {
                    Ok(decoded) => return Ok(decoded),
                    Err(e) => BalancerError::InvalidResponse(e.to_string()),
                },
                Err(e) => e,
            };

            if self.config.verbose {
                tracing::warn!(
                    kind = %kind,
                    url = %active.url,
                    error = %error,
                    "rpc call failed, rotating endpoint"
                );
            }

            // The retry observes this write before re-running selection.
            self.registry.mark_failed(kind, active.index);
            attempts += 1;

            match selection::select_node(
                &self.registry.snapshots(kind),
                self.config.allowed_blocks_behind,
            ) {
                Some(winner) => self
                    .registry
                    .set_active(kind, ActiveNode { url: winner.url, index: winner.index }),
                None => return Err(BalancerError::AllNodesUnavailable(Box::new(error))),
            }

            if attempts >= attempt_limit {
                return Err(BalancerError::AllNodesUnavailable(Box::new(error)));
            }
        }
    }
}

fn encode_body(payload: &(impl Serialize + ?Sized)) -> Result<Bytes, BalancerError> {
    serde_json::to_vec(payload)
        .map(Bytes::from)
        .map_err(|e| BalancerError::InvalidRequest(format!("request envelope: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RpcNode;
    use crate::balancer::endpoint::NodeEndpoint;
    use serde_json::json;
    use std::time::Duration;

    const PROBE_OK: &str = r#"{"jsonrpc":"2.0","result":"0x64","id":1}"#;

    fn request() -> JsonRpcRequest {
        JsonRpcRequest::new("eth_getBalance", json!(["0xabc", "latest"]), json!(1))
    }

    fn balancer(config: BalancerConfig) -> RpcBalancer {
        RpcBalancer::new(config).unwrap()
    }

    /// Seeds the private registry directly so dispatcher behavior can be
    /// tested without running bootstrap or a probe pass.
    fn seed(balancer: &RpcBalancer, kind: NodeKind, urls: &[String], active_index: Option<usize>) {
        let pool: Vec<Arc<NodeEndpoint>> =
            urls.iter().map(|url| Arc::new(NodeEndpoint::new(url, kind))).collect();
        balancer.registry.set_endpoints(kind, pool);
        if let Some(index) = active_index {
            balancer.registry.set_active(
                kind,
                ActiveNode { url: Arc::from(urls[index].as_str()), index },
            );
        }
    }

    #[test]
    fn test_new_rejects_unsupported_network() {
        let result = RpcBalancer::new(BalancerConfig::new(Network::Stellar));
        assert!(matches!(result, Err(BalancerError::UnsupportedNetwork(Network::Stellar))));
    }

    #[tokio::test]
    async fn test_call_with_no_endpoints_is_no_active_node() {
        let balancer = balancer(BalancerConfig::new(Network::Ethereum));
        let result = balancer.raw_rpc_call(&request(), false).await;
        assert!(matches!(result, Err(BalancerError::NoActiveNode)));
    }

    #[tokio::test]
    async fn test_basic_failover_rotates_to_second_endpoint() {
        let mut failing = mockito::Server::new_async().await;
        let failing_mock = failing.mock("POST", "/").with_status(500).create_async().await;
        let mut healthy = mockito::Server::new_async().await;
        let healthy_mock = healthy
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","result":"0xbeef","id":1}"#)
            .create_async()
            .await;

        let balancer = balancer(BalancerConfig::new(Network::Ethereum).with_allowed_blocks_behind(5));
        seed(&balancer, NodeKind::Normal, &[failing.url(), healthy.url()], Some(0));

        let response = balancer.raw_rpc_call(&request(), false).await.unwrap();

        failing_mock.assert_async().await;
        healthy_mock.assert_async().await;
        assert_eq!(response.result, Some(json!("0xbeef")));

        // The failing endpoint is flagged and the active moved.
        assert!(balancer.node_snapshots(NodeKind::Normal)[0].failed);
        assert_eq!(balancer.active_normal_url().unwrap().as_ref(), healthy.url());
    }

    #[tokio::test]
    async fn test_archive_fallback_when_normal_pool_empty() {
        let mut archive = mockito::Server::new_async().await;
        let mock = archive
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","result":"0x1","id":1}"#)
            .create_async()
            .await;

        let balancer = balancer(BalancerConfig::new(Network::Ethereum));
        seed(&balancer, NodeKind::Archive, &[archive.url()], Some(0));

        // Non-archive request resolves through the fallback.
        let response = balancer.raw_rpc_call(&request(), false).await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.result, Some(json!("0x1")));
    }

    #[tokio::test]
    async fn test_archive_request_prefers_archive_pool() {
        let mut normal = mockito::Server::new_async().await;
        let normal_mock = normal.mock("POST", "/").expect(0).create_async().await;
        let mut archive = mockito::Server::new_async().await;
        let archive_mock = archive
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","result":"0x2","id":1}"#)
            .create_async()
            .await;

        let balancer = balancer(BalancerConfig::new(Network::Ethereum));
        seed(&balancer, NodeKind::Normal, &[normal.url()], Some(0));
        seed(&balancer, NodeKind::Archive, &[archive.url()], Some(0));

        balancer.raw_rpc_call(&request(), true).await.unwrap();
        normal_mock.assert_async().await;
        archive_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_total_exhaustion_is_all_nodes_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/").with_status(502).expect_at_least(1).create_async().await;

        let balancer = balancer(BalancerConfig::new(Network::Ethereum));
        seed(&balancer, NodeKind::Normal, &[server.url()], Some(0));

        let result = balancer.raw_rpc_call(&request(), false).await;
        match result {
            Err(BalancerError::AllNodesUnavailable(source)) => {
                assert!(matches!(*source, BalancerError::HttpError(502, _)));
            }
            other => panic!("expected AllNodesUnavailable, got {other:?}"),
        }
        assert!(balancer.node_snapshots(NodeKind::Normal)[0].failed);
    }

    #[tokio::test]
    async fn test_rpc_error_member_is_returned_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","error":{"code":-32000,"message":"reverted"},"id":1}"#)
            .expect(1)
            .create_async()
            .await;

        let balancer = balancer(BalancerConfig::new(Network::Ethereum));
        seed(&balancer, NodeKind::Normal, &[server.url()], Some(0));

        let response = balancer.raw_rpc_call(&request(), false).await.unwrap();
        mock.assert_async().await;
        assert_eq!(response.error.unwrap().code, -32000);
        assert!(!balancer.node_snapshots(NodeKind::Normal)[0].failed);
    }

    #[tokio::test]
    async fn test_batch_resolves_archive_first() {
        let mut normal = mockito::Server::new_async().await;
        let normal_mock = normal.mock("POST", "/").expect(0).create_async().await;
        let mut archive = mockito::Server::new_async().await;
        let archive_mock = archive
            .mock("POST", "/")
            .with_body(
                r#"[{"jsonrpc":"2.0","result":"0x1","id":1},{"jsonrpc":"2.0","result":"0x2","id":2}]"#,
            )
            .create_async()
            .await;

        let balancer = balancer(BalancerConfig::new(Network::Ethereum));
        seed(&balancer, NodeKind::Normal, &[normal.url()], Some(0));
        seed(&balancer, NodeKind::Archive, &[archive.url()], Some(0));

        let batch = vec![
            JsonRpcRequest::new("eth_blockNumber", json!([]), json!(1)),
            JsonRpcRequest::new("eth_chainId", json!([]), json!(2)),
        ];
        let responses = balancer.raw_batch_rpc_call(&batch).await.unwrap();

        normal_mock.assert_async().await;
        archive_mock.assert_async().await;
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1].result, Some(json!("0x2")));
    }

    #[tokio::test]
    async fn test_post_targets_active_normal_without_failover() {
        let mut server = mockito::Server::new_async().await;
        let ok = server
            .mock("POST", "/v1/broadcast")
            .with_body(r#"{"txid":"abc"}"#)
            .create_async()
            .await;

        let balancer = balancer(BalancerConfig::new(Network::Tron));
        seed(&balancer, NodeKind::Normal, &[server.url()], Some(0));

        let value: serde_json::Value =
            balancer.post("/v1/broadcast", &json!({"raw": "0x00"})).await.unwrap();
        ok.assert_async().await;
        assert_eq!(value["txid"], "abc");
    }

    #[tokio::test]
    async fn test_post_propagates_error_without_marking_failed() {
        let mut server = mockito::Server::new_async().await;
        server.mock("POST", "/v1/broadcast").with_status(400).create_async().await;

        let balancer = balancer(BalancerConfig::new(Network::Tron));
        seed(&balancer, NodeKind::Normal, &[server.url()], Some(0));

        let result: Result<serde_json::Value, _> =
            balancer.post("/v1/broadcast", &json!({})).await;
        assert!(matches!(result, Err(BalancerError::HttpError(400, _))));
        assert!(!balancer.node_snapshots(NodeKind::Normal)[0].failed);
        assert!(balancer.active_normal_url().is_some(), "post never rotates the active");
    }

    #[tokio::test]
    async fn test_post_without_active_normal_is_no_active_node() {
        let balancer = balancer(BalancerConfig::new(Network::Tron));
        let result: Result<serde_json::Value, _> = balancer.post("/v1/broadcast", &json!({})).await;
        assert!(matches!(result, Err(BalancerError::NoActiveNode)));
    }

    #[tokio::test]
    async fn test_one_shot_init_probes_once_and_installs_no_timer() {
        let mut server = mockito::Server::new_async().await;
        let probe_mock = server.mock("POST", "/").with_body(PROBE_OK).expect(1).create_async().await;

        let config = BalancerConfig::new(Network::Ethereum)
            .with_nodes(vec![RpcNode::new(server.url(), NodeKind::Normal)])
            .with_one_time_load_balancing(true);
        let balancer = balancer(config);

        balancer.init().await.unwrap();

        probe_mock.assert_async().await;
        assert!(!balancer.scheduler.is_running());
        assert_eq!(balancer.active_normal_url().unwrap().as_ref(), server.url());

        let snapshot = &balancer.node_snapshots(NodeKind::Normal)[0];
        assert_eq!(snapshot.last_block, 100);
    }

    #[tokio::test]
    async fn test_periodic_init_installs_timer_and_destroy_cancels_it() {
        let config = BalancerConfig::new(Network::Ethereum)
            .with_nodes(vec![RpcNode::new("https://eth.rpc.example", NodeKind::Normal)])
            .with_poll_interval(Duration::from_secs(3600));
        let balancer = balancer(config);

        balancer.init().await.unwrap();
        assert!(balancer.scheduler.is_running());

        balancer.destroy();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!balancer.scheduler.is_running());

        // Idempotent.
        balancer.destroy();
    }

    #[tokio::test]
    async fn test_second_init_is_rejected() {
        let config = BalancerConfig::new(Network::Ethereum)
            .with_nodes(Vec::new())
            .with_poll_interval(Duration::from_secs(3600));
        let balancer = balancer(config);

        balancer.init().await.unwrap();
        let result = balancer.init().await;
        assert!(matches!(result, Err(BalancerError::InvalidRequest(_))));
        balancer.destroy();
    }

    #[tokio::test]
    async fn test_empty_remote_bootstrap_defers_failure_to_first_call() {
        let mut server = mockito::Server::new_async().await;
        server.mock("GET", "/ethereum-mainnet/list.json").with_body("[]").create_async().await;
        server
            .mock("GET", "/ethereum-mainnet-archive/list.json")
            .with_body("[]")
            .create_async()
            .await;

        let config = BalancerConfig::new(Network::Ethereum)
            .with_manifest_base_url(server.url())
            .with_poll_interval(Duration::from_secs(3600));
        let balancer = balancer(config);

        balancer.init().await.unwrap();
        let result = balancer.raw_rpc_call(&request(), false).await;
        assert!(matches!(result, Err(BalancerError::NoActiveNode)));
        balancer.destroy();
    }

    #[tokio::test]
    async fn test_stats_reflect_pool_state() {
        let balancer = balancer(BalancerConfig::new(Network::Ethereum));
        seed(
            &balancer,
            NodeKind::Normal,
            &["https://a.rpc.example".to_string(), "https://b.rpc.example".to_string()],
            Some(1),
        );
        balancer.registry.mark_failed(NodeKind::Normal, 0);

        let stats = balancer.stats();
        assert_eq!(stats.normal.total, 2);
        assert_eq!(stats.normal.failed, 1);
        assert_eq!(stats.normal.active_url.unwrap().as_ref(), "https://b.rpc.example");
        assert_eq!(stats.archive.total, 0);
        assert!(stats.archive.active_url.is_none());
    }

    #[tokio::test]
    async fn test_active_pair_invariant_after_failover() {
        let mut failing = mockito::Server::new_async().await;
        failing.mock("POST", "/").with_status(500).create_async().await;
        let mut healthy = mockito::Server::new_async().await;
        healthy
            .mock("POST", "/")
            .with_body(r#"{"jsonrpc":"2.0","result":"0x1","id":1}"#)
            .create_async()
            .await;

        let balancer = balancer(BalancerConfig::new(Network::Ethereum));
        seed(&balancer, NodeKind::Normal, &[failing.url(), healthy.url()], Some(0));

        balancer.raw_rpc_call(&request(), false).await.unwrap();

        let active = balancer.registry.active(NodeKind::Normal).unwrap();
        let pool = balancer.registry.endpoints(NodeKind::Normal);
        assert_eq!(*pool[active.index].url(), active.url);
    }
}
