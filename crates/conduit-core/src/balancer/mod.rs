//! Upstream endpoint management and load balancing.
//!
//! This module keeps one pool of NORMAL and one pool of ARCHIVE endpoints
//! per balancer instance, ranks them continuously, and dispatches client
//! calls with transparent failover:
//!
//! - Registry of endpoint records with per-endpoint health metrics
//! - Periodic status probing with per-network payload codecs
//! - Pure freshness/latency selection policy
//! - Bounded-lifetime scheduler with one-shot mode
//! - Dispatching facade with cross-pool fallback and endpoint rotation
//! - SSRF-filtered remote endpoint discovery
//!
//! # Selection Priority
//!
//! When a probe pass (or a dispatch failure) re-selects a pool's active
//! endpoint, candidates are ranked in this order:
//!
//! 1. **Liveness**: endpoints flagged as failed are never selected.
//! 2. **Freshness**: a candidate more than `allowed_blocks_behind` blocks
//!    ahead of the running winner takes over regardless of latency.
//! 3. **Latency**: at equal height, the faster endpoint wins; ties keep
//!    the earlier list position.
//!
//! ## Dispatch Flow
//!
//! ```text
//! Request → resolve active (requested pool → other pool)
//!              │
//!              ├─ none            → NoActiveNode
//!              │
//!              └─ POST ── ok      → response (uninterpreted)
//!                   │
//!                   └─ error      → mark failed → re-select pool
//!                                     ├─ winner → swap active, retry
//!                                     └─ none   → AllNodesUnavailable
//! ```

mod bootstrap;
pub mod codec;
pub mod dispatcher;
pub mod endpoint;
pub mod errors;
pub mod http;
mod probe;
mod scheduler;
pub mod registry;
pub mod selection;

pub use dispatcher::{BalancerStats, PoolStats, RpcBalancer};
pub use endpoint::{NodeEndpoint, NodeMetrics, NodeSnapshot};
pub use errors::BalancerError;
pub use registry::{ActiveNode, EndpointRegistry};
pub use selection::{select_node, Selected};
