use serde_json::{json, Value};
use std::sync::Arc;

use crate::balancer::{BalancerError, RpcBalancer};

use super::generic::GenericRpc;

/// Typed façade for EVM-family networks.
///
/// Thin helpers over [`GenericRpc`] for the handful of methods callers use
/// most; everything else goes through [`EvmRpc::rpc`] untyped.
pub struct EvmRpc {
    rpc: GenericRpc,
}

impl EvmRpc {
    #[must_use]
    pub fn new(balancer: Arc<RpcBalancer>) -> Self {
        Self { rpc: GenericRpc::new(balancer) }
    }

    /// The untyped façade, for methods without a typed helper.
    #[must_use]
    pub fn rpc(&self) -> &GenericRpc {
        &self.rpc
    }

    /// `eth_blockNumber` as a plain integer.
    ///
    /// # Errors
    ///
    /// Dispatch errors, plus [`BalancerError::InvalidResponse`] when the
    /// result is not a hex quantity.
    pub async fn block_number(&self) -> Result<u64, BalancerError> {
        let result = self.rpc.call_result("eth_blockNumber", json!([])).await?;
        parse_quantity(&result)
    }

    /// `eth_chainId` as a plain integer.
    ///
    /// # Errors
    ///
    /// Same as [`EvmRpc::block_number`].
    pub async fn chain_id(&self) -> Result<u64, BalancerError> {
        let result = self.rpc.call_result("eth_chainId", json!([])).await?;
        parse_quantity(&result)
    }

    /// `eth_gasPrice` as a plain integer (wei).
    ///
    /// # Errors
    ///
    /// Same as [`EvmRpc::block_number`].
    pub async fn gas_price(&self) -> Result<u64, BalancerError> {
        let result = self.rpc.call_result("eth_gasPrice", json!([])).await?;
        parse_quantity(&result)
    }

    /// `eth_getBalance` for `address` at `block_tag` (e.g. `"latest"`),
    /// returned as the raw hex quantity string.
    ///
    /// # Errors
    ///
    /// Dispatch errors, plus [`BalancerError::InvalidResponse`] when the
    /// result is not a string.
    pub async fn get_balance(
        &self,
        address: &str,
        block_tag: &str,
    ) -> Result<String, BalancerError> {
        let result = self.rpc.call_result("eth_getBalance", json!([address, block_tag])).await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            BalancerError::InvalidResponse("eth_getBalance result is not a string".to_string())
        })
    }

    /// `eth_getBlockByNumber` for a historical block, routed archive-first.
    ///
    /// # Errors
    ///
    /// Dispatch errors; an error member maps to [`BalancerError::RpcError`].
    pub async fn get_block_by_number(
        &self,
        block_tag: &str,
        full_transactions: bool,
    ) -> Result<Value, BalancerError> {
        let response = self
            .rpc
            .call_archive("eth_getBlockByNumber", json!([block_tag, full_transactions]))
            .await?;
        super::generic::expect_result(response)
    }
}

fn parse_quantity(value: &Value) -> Result<u64, BalancerError> {
    let invalid =
        || BalancerError::InvalidResponse(format!("not a hex quantity: {value}"));

    match value {
        Value::String(text) => {
            let hex = text.strip_prefix("0x").ok_or_else(invalid)?;
            u64::from_str_radix(hex, 16).map_err(|_| invalid())
        }
        Value::Number(number) => number.as_u64().ok_or_else(invalid),
        _ => Err(invalid()),
    }
}
