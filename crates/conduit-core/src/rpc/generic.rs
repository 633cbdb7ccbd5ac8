use serde_json::Value;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::{
    balancer::{BalancerError, RpcBalancer},
    types::{JsonRpcRequest, JsonRpcResponse},
};

/// Catch-all JSON-RPC façade.
///
/// Builds envelopes with monotonically increasing request ids and delegates
/// to the balancer; pure serialization, no chain semantics.
pub struct GenericRpc {
    balancer: Arc<RpcBalancer>,
    next_id: AtomicU64,
}

impl GenericRpc {
    #[must_use]
    pub fn new(balancer: Arc<RpcBalancer>) -> Self {
        Self { balancer, next_id: AtomicU64::new(1) }
    }

    /// The balancer this façade dispatches through.
    #[must_use]
    pub fn balancer(&self) -> &Arc<RpcBalancer> {
        &self.balancer
    }

    /// Builds a JSON-RPC envelope with the next request id.
    #[must_use]
    pub fn prepare_rpc_call(&self, method: impl Into<String>, params: Value) -> JsonRpcRequest {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        JsonRpcRequest::new(method, params, Value::from(id))
    }

    /// Sends a single call through the balancer's normal-first path.
    ///
    /// # Errors
    ///
    /// Propagates balancer dispatch errors; the response's JSON-RPC `error`
    /// member is left for the caller (see [`GenericRpc::call_result`]).
    pub async fn call(
        &self,
        method: impl Into<String>,
        params: Value,
    ) -> Result<JsonRpcResponse, BalancerError> {
        let request = self.prepare_rpc_call(method, params);
        self.balancer.raw_rpc_call(&request, false).await
    }

    /// Sends a single call preferring the archive pool.
    ///
    /// # Errors
    ///
    /// Same as [`GenericRpc::call`].
    pub async fn call_archive(
        &self,
        method: impl Into<String>,
        params: Value,
    ) -> Result<JsonRpcResponse, BalancerError> {
        let request = self.prepare_rpc_call(method, params);
        self.balancer.raw_rpc_call(&request, true).await
    }

    /// Sends a call and unwraps its `result`, converting a JSON-RPC error
    /// member into [`BalancerError::RpcError`].
    ///
    /// # Errors
    ///
    /// [`BalancerError::RpcError`] when the endpoint answered with an error
    /// object, [`BalancerError::InvalidResponse`] when it answered with
    /// neither member, plus any dispatch error.
    pub async fn call_result(
        &self,
        method: impl Into<String>,
        params: Value,
    ) -> Result<Value, BalancerError> {
        expect_result(self.call(method, params).await?)
    }

    /// Sends several calls as one JSON-RPC batch (archive-first by the
    /// balancer's batch contract).
    ///
    /// # Errors
    ///
    /// Propagates balancer dispatch errors.
    pub async fn batch(
        &self,
        calls: Vec<(String, Value)>,
    ) -> Result<Vec<JsonRpcResponse>, BalancerError> {
        let requests: Vec<JsonRpcRequest> = calls
            .into_iter()
            .map(|(method, params)| self.prepare_rpc_call(method, params))
            .collect();
        self.balancer.raw_batch_rpc_call(&requests).await
    }
}

/// Unwraps the `result` member of a response.
pub(crate) fn expect_result(response: JsonRpcResponse) -> Result<Value, BalancerError> {
    if let Some(error) = response.error {
        return Err(BalancerError::RpcError(error.code, error.message));
    }
    response
        .result
        .ok_or_else(|| BalancerError::InvalidResponse("response carries no result".to_string()))
}
