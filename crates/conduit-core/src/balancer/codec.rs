//! Network-aware status payload codec.
//!
//! Encodes the health-probe request for a network and decodes the chain
//! height from its response. UTXO-family chains answer `getblockcount` with
//! a plain number; EVM-family chains (and Tron's EVM surface) answer
//! `eth_blockNumber` with a `0x`-prefixed hex quantity. Families without a
//! codec are not subject to load balancing and must never reach the probe.

use serde_json::{json, Value};

use crate::{
    network::{ChainFamily, Network},
    types::{JsonRpcRequest, JsonRpcResponse},
};

use super::errors::BalancerError;

/// Sentinel height for an endpoint that answered without a usable result.
pub const HEIGHT_UNKNOWN: i64 = -1;

/// Builds the probe request for `network`.
///
/// # Errors
///
/// Returns [`BalancerError::UnsupportedNetwork`] for families without a
/// status payload.
pub fn probe_payload(network: Network) -> Result<JsonRpcRequest, BalancerError> {
    match network.family() {
        ChainFamily::Utxo => Ok(JsonRpcRequest::new("getblockcount", json!([]), json!(1))),
        ChainFamily::Evm | ChainFamily::Tron => {
            Ok(JsonRpcRequest::new("eth_blockNumber", json!([]), json!(1)))
        }
        _ => Err(BalancerError::UnsupportedNetwork(network)),
    }
}

/// Extracts the chain height from a probe response.
///
/// An absent or falsy `result`, or one that does not decode as a height,
/// yields [`HEIGHT_UNKNOWN`].
///
/// # Errors
///
/// Returns [`BalancerError::UnsupportedNetwork`] for families without a
/// status payload.
pub fn decode_height(network: Network, response: &JsonRpcResponse) -> Result<i64, BalancerError> {
    if !network.supports_load_balancing() {
        return Err(BalancerError::UnsupportedNetwork(network));
    }

    Ok(response.result.as_ref().map_or(HEIGHT_UNKNOWN, decode_height_value))
}

fn decode_height_value(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number.as_i64().filter(|height| *height > 0).unwrap_or(HEIGHT_UNKNOWN),
        Value::String(text) if !text.is_empty() => {
            let parsed = text
                .strip_prefix("0x")
                .map_or_else(|| text.parse::<i64>().ok(), |hex| i64::from_str_radix(hex, 16).ok());
            parsed.filter(|height| *height > 0).unwrap_or(HEIGHT_UNKNOWN)
        }
        _ => HEIGHT_UNKNOWN,
    }
}
