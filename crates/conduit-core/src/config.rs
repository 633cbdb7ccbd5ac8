//! Balancer configuration.
//!
//! Configuration is supplied programmatically by the embedding SDK; the core
//! reads no environment variables and no files. Construct with
//! [`BalancerConfig::new`] and refine with the `with_*` builders:
//!
//! ```
//! use conduit_core::{config::BalancerConfig, network::Network, types::{NodeKind, RpcNode}};
//!
//! let config = BalancerConfig::new(Network::Ethereum)
//!     .with_nodes(vec![RpcNode::new("https://eth.rpc.example", NodeKind::Normal)])
//!     .with_allowed_blocks_behind(5)
//!     .with_verbose(true);
//! ```

use crate::{network::Network, types::RpcNode};
use std::time::Duration;

/// Default tolerance for how many blocks an endpoint may trail the leader
/// while still being considered equivalently fresh.
pub const DEFAULT_ALLOWED_BLOCKS_BEHIND: i64 = 0;

/// Default per-probe request deadline.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default delay between periodic probe passes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Base URL for the hosted endpoint manifests used by remote bootstrap.
pub const DEFAULT_MANIFEST_BASE_URL: &str = "https://rpc.tatum.io";

/// Configuration for a balancer instance.
///
/// Multiple balancer instances never share state; each carries its own
/// configuration capsule.
#[derive(Debug, Clone)]
pub struct BalancerConfig {
    /// Network the balancer serves. Selects manifest URLs and the status
    /// payload codec.
    pub network: Network,
    /// Caller-supplied endpoint list. When present, remote manifest fetching
    /// is skipped entirely and the SSRF filter is bypassed (the caller is
    /// trusted).
    pub nodes: Option<Vec<RpcNode>>,
    /// Selection tolerance: an endpoint within this many blocks of the
    /// current winner does not displace it on height alone.
    pub allowed_blocks_behind: i64,
    /// Perform exactly one probe pass during `init` and never install the
    /// periodic timer.
    pub one_time_load_balancing: bool,
    /// Emit diagnostic logs for recovered per-endpoint errors.
    pub verbose: bool,
    /// Optional API key forwarded as the `x-api-key` header.
    pub api_key: Option<String>,
    /// Abort deadline for each status probe request.
    pub probe_timeout: Duration,
    /// Delay between periodic probe passes.
    pub poll_interval: Duration,
    /// Base URL of the endpoint manifest host. Overridable for tests; the
    /// SSRF allow-list stays anchored to the production host regardless.
    pub manifest_base_url: String,
}

impl BalancerConfig {
    /// Creates a configuration for `network` with default knobs and no
    /// static nodes (remote bootstrap).
    #[must_use]
    pub fn new(network: Network) -> Self {
        Self {
            network,
            nodes: None,
            allowed_blocks_behind: DEFAULT_ALLOWED_BLOCKS_BEHIND,
            one_time_load_balancing: false,
            verbose: false,
            api_key: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            manifest_base_url: DEFAULT_MANIFEST_BASE_URL.to_string(),
        }
    }

    /// Supplies a trusted static endpoint list, disabling remote discovery.
    #[must_use]
    pub fn with_nodes(mut self, nodes: Vec<RpcNode>) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Sets the selection freshness tolerance.
    #[must_use]
    pub fn with_allowed_blocks_behind(mut self, blocks: i64) -> Self {
        self.allowed_blocks_behind = blocks;
        self
    }

    /// Runs a single probe pass at `init` instead of installing the timer.
    #[must_use]
    pub fn with_one_time_load_balancing(mut self, one_time: bool) -> Self {
        self.one_time_load_balancing = one_time;
        self
    }

    /// Enables diagnostic logging of recovered errors.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Forwards `key` as the `x-api-key` header on every outbound request.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the per-probe request deadline.
    #[must_use]
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Overrides the delay between periodic probe passes.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the manifest host, for tests pointing at a mock server.
    #[must_use]
    pub fn with_manifest_base_url(mut self, base: impl Into<String>) -> Self {
        self.manifest_base_url = base.into();
        self
    }
}
