//! Periodic status probing.
//!
//! One pass probes every registered endpoint: pools are visited
//! sequentially (normal, then archive), endpoints within a pool
//! concurrently. Each probe POSTs the network's status payload under an
//! abort deadline, records latency and height, and flips the failure flag.
//! The pass settles with a wait-for-all composition, then the selection
//! policy publishes a fresh active pair per pool in one atomic swap.

use bytes::Bytes;
use futures::future::join_all;
use std::{sync::Arc, time::Instant};

use crate::{config::BalancerConfig, types::NodeKind};

use super::{
    codec,
    endpoint::NodeEndpoint,
    errors::BalancerError,
    http::HttpClient,
    registry::{ActiveNode, EndpointRegistry},
    selection,
};

pub(crate) struct StatusProbe {
    http: Arc<HttpClient>,
    config: BalancerConfig,
}

impl StatusProbe {
    pub(crate) fn new(http: Arc<HttpClient>, config: BalancerConfig) -> Self {
        Self { http, config }
    }

    /// Runs one complete probe pass and republishes the active selections.
    ///
    /// # Errors
    ///
    /// - [`BalancerError::UnsupportedNetwork`] if the network has no status
    ///   payload codec (raised eagerly, before any request).
    /// - [`BalancerError::NoActiveNode`] if neither pool has a usable
    ///   endpoint once the pass settles.
    pub(crate) async fn run_pass(&self, registry: &EndpointRegistry) -> Result<(), BalancerError> {
        let payload = codec::probe_payload(self.config.network)?;

        if registry.is_empty() {
            tracing::warn!(network = %self.config.network, "probe pass skipped: no endpoints registered");
            return Ok(());
        }

        let body = Bytes::from(
            serde_json::to_vec(&payload)
                .map_err(|e| BalancerError::InvalidRequest(format!("probe payload: {e}")))?,
        );

        for kind in NodeKind::ALL {
            let pool = registry.endpoints(kind);
            let probes = pool.iter().map(|endpoint| self.probe_endpoint(endpoint, body.clone()));
            // Settles when every probe has either succeeded or failed; a
            // single endpoint never aborts the pass.
            join_all(probes).await;

            match selection::select_node(&registry.snapshots(kind), self.config.allowed_blocks_behind)
            {
                Some(winner) => {
                    tracing::debug!(kind = %kind, url = %winner.url, "active endpoint selected");
                    registry.set_active(kind, ActiveNode { url: winner.url, index: winner.index });
                }
                None => {
                    tracing::warn!(kind = %kind, "no selectable endpoint after probe pass");
                    registry.clear_active(kind);
                }
            }
        }

        if NodeKind::ALL.iter().all(|kind| registry.active(*kind).is_none()) {
            return Err(BalancerError::NoActiveNode);
        }

        Ok(())
    }

    async fn probe_endpoint(&self, endpoint: &Arc<NodeEndpoint>, body: Bytes) {
        let started = Instant::now();
        let result = self
            .http
            .post_json(endpoint.url(), body, Some(self.config.probe_timeout))
            .await;
        #[allow(clippy::cast_possible_truncation)]
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(bytes) => match serde_json::from_slice::<crate::types::JsonRpcResponse>(&bytes) {
                Ok(response) => {
                    // probe_payload already vetted the network, so decode
                    // cannot fail here; treat a defensive miss as no height.
                    let height = codec::decode_height(self.config.network, &response)
                        .unwrap_or(codec::HEIGHT_UNKNOWN);
                    if height > codec::HEIGHT_UNKNOWN {
                        endpoint.record_probe_success(height, elapsed_ms);
                        tracing::debug!(
                            url = %endpoint.url(),
                            block = height,
                            response_time_ms = elapsed_ms,
                            "status probe passed"
                        );
                    } else {
                        endpoint.record_probe_failure(Some(elapsed_ms));
                        self.log_probe_failure(endpoint, "endpoint answered without a height");
                    }
                }
                Err(_) => {
                    endpoint.record_probe_failure(Some(elapsed_ms));
                    self.log_probe_failure(endpoint, "endpoint returned malformed JSON");
                }
            },
            Err(error) => {
                let elapsed = error.response_arrived().then_some(elapsed_ms);
                endpoint.record_probe_failure(elapsed);
                self.log_probe_failure(endpoint, &error.to_string());
            }
        }
    }

    fn log_probe_failure(&self, endpoint: &NodeEndpoint, reason: &str) {
        if self.config.verbose {
            tracing::warn!(url = %endpoint.url(), reason = %reason, "status probe failed");
        }
    }
}
