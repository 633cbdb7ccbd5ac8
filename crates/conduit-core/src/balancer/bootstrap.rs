//! Registry bootstrap.
//!
//! Populates the endpoint registry exactly once, in one of two modes:
//!
//! - **Static**: the caller supplied `config.nodes`. The list is trusted and
//!   the SSRF filter is bypassed.
//! - **Remote**: the normal and archive endpoint manifests are fetched
//!   concurrently from the well-known host. Every discovered URL must pass
//!   the host allow-list before registration; a failed manifest fetch logs
//!   and is non-fatal.
//!
//! After either mode, each non-empty pool gets a uniformly random initial
//! active endpoint. The randomness is genuine so a fleet of freshly started
//! clients spreads its first calls across the pool instead of stampeding a
//! single node.

use rand::Rng;
use std::{sync::Arc, time::Duration};
use url::Url;

use crate::{
    config::BalancerConfig,
    types::{NodeKind, RpcNode},
};

use super::{
    endpoint::NodeEndpoint,
    errors::BalancerError,
    http::HttpClient,
    registry::{ActiveNode, EndpointRegistry},
};

/// Required hostname suffix for URLs discovered through the remote manifest.
/// Caller-supplied nodes bypass this check.
const ALLOWED_HOST_SUFFIX: &str = "rpc.tatum.io";

/// Deadline for each manifest fetch.
const MANIFEST_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Populates `registry` from configuration and picks the initial actives.
///
/// An empty result set is not an error here: the first dispatched call will
/// surface [`BalancerError::NoActiveNode`] instead, and no re-fetch is
/// attempted.
///
/// # Errors
///
/// Currently infallible in both modes (manifest failures are recovered);
/// the `Result` keeps the seam for transport-level hard failures.
pub(crate) async fn populate_registry(
    http: &HttpClient,
    config: &BalancerConfig,
    registry: &EndpointRegistry,
) -> Result<(), BalancerError> {
    let nodes = match &config.nodes {
        Some(nodes) => {
            tracing::info!(count = nodes.len(), "bootstrapping from caller-supplied nodes");
            nodes.clone()
        }
        None => fetch_remote_nodes(http, config).await,
    };

    for kind in NodeKind::ALL {
        let pool: Vec<Arc<NodeEndpoint>> = nodes
            .iter()
            .filter(|node| node.kind == kind)
            .map(|node| Arc::new(NodeEndpoint::new(&node.url, kind)))
            .collect();

        tracing::debug!(kind = %kind, count = pool.len(), "registered endpoint pool");
        registry.set_endpoints(kind, pool);
        randomize_initial_active(registry, kind);
    }

    Ok(())
}

/// Fetches the normal and archive manifests concurrently and keeps the
/// entries that pass the host allow-list.
async fn fetch_remote_nodes(http: &HttpClient, config: &BalancerConfig) -> Vec<RpcNode> {
    let slug = config.network.manifest_slug();
    let base = config.manifest_base_url.trim_end_matches('/');
    let normal_url = format!("{base}/{slug}/list.json");
    let archive_url = format!("{base}/{slug}-archive/list.json");

    let (normal, archive) = tokio::join!(
        fetch_manifest(http, &normal_url),
        fetch_manifest(http, &archive_url),
    );

    normal
        .into_iter()
        .chain(archive)
        .filter(|node| {
            let allowed = is_allowed_host(&node.url);
            if !allowed {
                tracing::warn!(url = %node.url, "dropping manifest node outside the allow-list");
            }
            allowed
        })
        .collect()
}

/// Fetches and decodes a single manifest. Failures log and yield an empty
/// list; losing one manifest is fine as long as the other registers nodes.
async fn fetch_manifest(http: &HttpClient, url: &str) -> Vec<RpcNode> {
    match http.get(url, MANIFEST_FETCH_TIMEOUT).await {
        Ok(bytes) => match serde_json::from_slice::<Vec<RpcNode>>(&bytes) {
            Ok(nodes) => {
                tracing::debug!(url = %url, count = nodes.len(), "fetched endpoint manifest");
                nodes
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "endpoint manifest did not decode");
                Vec::new()
            }
        },
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "endpoint manifest fetch failed");
            Vec::new()
        }
    }
}

/// The SSRF allow-list: the URL must parse and its host must end in the
/// well-known provider suffix.
fn is_allowed_host(raw_url: &str) -> bool {
    Url::parse(raw_url)
        .ok()
        .and_then(|url| url.host_str().map(|host| host.ends_with(ALLOWED_HOST_SUFFIX)))
        .unwrap_or(false)
}

/// Publishes a uniformly random initial active for a non-empty pool.
fn randomize_initial_active(registry: &EndpointRegistry, kind: NodeKind) {
    let pool = registry.endpoints(kind);
    if pool.is_empty() {
        return;
    }

    let index = rand::rng().random_range(0..pool.len());
    let url = Arc::clone(pool[index].url());
    tracing::debug!(kind = %kind, url = %url, index, "initial active endpoint");
    registry.set_active(kind, ActiveNode { url, index });
}
