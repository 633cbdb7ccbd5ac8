//! Typed façades over the balancer.
//!
//! Each chain family exposes a thin adapter that serializes method names and
//! parameters into JSON-RPC envelopes and delegates to
//! [`RpcBalancer::raw_rpc_call`](crate::balancer::RpcBalancer::raw_rpc_call).
//! Adapters hold no state beyond a balancer handle and a request-id counter;
//! the balancer behaves identically regardless of which adapter invoked it.
//!
//! [`GenericRpc`] is the catch-all used by the SDK's adapter-selection table
//! when a network has no dedicated façade; [`EvmRpc`] and [`UtxoRpc`] add a
//! handful of typed helpers on top of it.

pub mod evm;
pub mod generic;
pub mod utxo;

pub use evm::EvmRpc;
pub use generic::GenericRpc;
pub use utxo::UtxoRpc;
