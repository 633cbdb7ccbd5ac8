use thiserror::Error;

use crate::network::Network;

/// Errors produced by the balancer core.
///
/// Per-endpoint transport failures are recovered internally by failover and
/// only escape attached to [`BalancerError::AllNodesUnavailable`] (or
/// propagated verbatim from [`post`](crate::balancer::RpcBalancer::post),
/// which performs no failover). Pool-exhaustion and unsupported-network
/// errors always surface to the caller.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BalancerError {
    /// The network's family has no status payload codec and must not be
    /// routed through the balancer.
    #[error("network {0} is not subject to load balancing")]
    UnsupportedNetwork(Network),

    /// No endpoint of either kind is usable.
    #[error("no active node available")]
    NoActiveNode,

    /// Failover exhausted every endpoint of the pool in use.
    ///
    /// Carries the transport error from the last attempt.
    #[error("all nodes are unavailable")]
    AllNodesUnavailable(#[source] Box<BalancerError>),

    /// Request exceeded its abort deadline.
    #[error("request timeout")]
    Timeout,

    /// Failed to reach the endpoint at the transport level.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Non-2xx HTTP status. First field is the status code, second a
    /// truncated response excerpt.
    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    /// Response body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request could not be built or serialized, or the balancer was used
    /// out of lifecycle order.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// JSON-RPC error object returned by an endpoint.
    ///
    /// Never raised by the balancer core, which hands responses back
    /// uninterpreted; the typed façades raise it when a caller asks for the
    /// decoded `result`.
    #[error("RPC error {0}: {1}")]
    RpcError(i32, String),
}

impl BalancerError {
    /// Whether this error came from a single endpoint and should trigger
    /// failover rather than surfacing to the caller.
    #[must_use]
    pub fn is_endpoint_failure(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionFailed(_) | Self::HttpError(..) | Self::InvalidResponse(_)
        )
    }

    /// Whether a response actually arrived from the endpoint.
    ///
    /// The status probe records response time only for errors where the
    /// endpoint answered (bad status, undecodable body), not for timeouts or
    /// connection failures.
    #[must_use]
    pub fn response_arrived(&self) -> bool {
        matches!(self, Self::HttpError(..) | Self::InvalidResponse(_))
    }
}
