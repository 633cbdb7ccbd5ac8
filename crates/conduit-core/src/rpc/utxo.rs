use serde_json::{json, Value};
use std::sync::Arc;

use crate::balancer::{BalancerError, RpcBalancer};

use super::generic::GenericRpc;

/// Typed façade for UTXO-family networks (Bitcoin-like JSON-RPC surface).
pub struct UtxoRpc {
    rpc: GenericRpc,
}

impl UtxoRpc {
    #[must_use]
    pub fn new(balancer: Arc<RpcBalancer>) -> Self {
        Self { rpc: GenericRpc::new(balancer) }
    }

    /// The untyped façade, for methods without a typed helper.
    #[must_use]
    pub fn rpc(&self) -> &GenericRpc {
        &self.rpc
    }

    /// `getblockcount` as a plain integer.
    ///
    /// # Errors
    ///
    /// Dispatch errors, plus [`BalancerError::InvalidResponse`] when the
    /// result is not a number.
    pub async fn get_block_count(&self) -> Result<u64, BalancerError> {
        let result = self.rpc.call_result("getblockcount", json!([])).await?;
        result.as_u64().ok_or_else(|| {
            BalancerError::InvalidResponse("getblockcount result is not a number".to_string())
        })
    }

    /// `getbestblockhash` as a hex string.
    ///
    /// # Errors
    ///
    /// Dispatch errors, plus [`BalancerError::InvalidResponse`] when the
    /// result is not a string.
    pub async fn get_best_block_hash(&self) -> Result<String, BalancerError> {
        let result = self.rpc.call_result("getbestblockhash", json!([])).await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            BalancerError::InvalidResponse("getbestblockhash result is not a string".to_string())
        })
    }

    /// `getrawtransaction` with verbose output, routed archive-first since
    /// the transaction may be arbitrarily old.
    ///
    /// # Errors
    ///
    /// Dispatch errors; an error member maps to [`BalancerError::RpcError`].
    pub async fn get_raw_transaction(&self, txid: &str) -> Result<Value, BalancerError> {
        let response = self.rpc.call_archive("getrawtransaction", json!([txid, true])).await?;
        super::generic::expect_result(response)
    }
}
