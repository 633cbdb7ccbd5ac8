//! # Conduit Core
//!
//! Core library for the Conduit multi-blockchain SDK: a load-balanced
//! JSON-RPC dispatch layer that keeps a pool of upstream endpoints per
//! network, continuously ranks them by chain freshness and latency, and
//! fails over transparently when a call errors.
//!
//! This crate provides the foundational components for:
//!
//! - **[`balancer`]**: The load balancer itself: endpoint registry, periodic
//!   status probing, selection policy, scheduler, and the dispatching facade
//!   ([`RpcBalancer`]) with cross-pool fallback and SSRF-filtered remote
//!   endpoint discovery.
//!
//! - **[`rpc`]**: Thin typed façades over the balancer. Adapters hold no
//!   state beyond a balancer handle; they serialize method names and
//!   parameters and delegate to [`RpcBalancer::raw_rpc_call`].
//!
//! - **[`network`]**: The closed set of supported chains, their family
//!   classification, and the remote-manifest slug table.
//!
//! - **[`config`]**: Balancer configuration, supplied by the embedding SDK at
//!   construction time. The core reads no environment variables.
//!
//! - **[`types`]**: JSON-RPC 2.0 envelope types and node descriptors.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       RpcBalancer                        │
//! │  ┌────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │ Bootstrap  │  │  Scheduler   │  │    Dispatcher    │  │
//! │  │ (static /  │  │ (periodic /  │  │ (resolve, POST,  │  │
//! │  │  manifest) │  │   one-shot)  │  │  mark, failover) │  │
//! │  └─────┬──────┘  └──────┬───────┘  └────────┬─────────┘  │
//! │        │                │                   │            │
//! │        ▼                ▼                   ▼            │
//! │  ┌──────────────────────────────────────────────────┐    │
//! │  │                EndpointRegistry                  │    │
//! │  │   endpoints[Normal] / endpoints[Archive]         │    │
//! │  │   active[Normal]    / active[Archive]            │    │
//! │  └──────────────────────────────────────────────────┘    │
//! │        ▲                                                 │
//! │        │ metrics writes                                  │
//! │  ┌─────┴──────┐   ┌──────────────┐                       │
//! │  │ StatusProbe│──▶│ SelectionPol.│ (pure, over snapshots)│
//! │  └────────────┘   └──────────────┘                       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Request Flow
//!
//! ```text
//! Client call (typed façade)
//!       │  prepare_rpc_call(method, params)
//!       ▼
//! RpcBalancer::raw_rpc_call
//!       │  resolve active URL (requested kind, fallback to other kind)
//!       ▼
//! HTTP POST ── ok ──► raw JsonRpcResponse to caller
//!       │
//!       └─ error ──► mark active endpoint failed
//!                    re-run selection on that pool
//!                    ├─ winner  ──► swap active, retry (bounded)
//!                    └─ none    ──► AllNodesUnavailable
//! ```

pub mod balancer;
pub mod config;
pub mod network;
pub mod rpc;
pub mod types;

pub use balancer::{BalancerError, BalancerStats, RpcBalancer};
pub use config::BalancerConfig;
pub use network::{ChainFamily, Network};
pub use types::{JsonRpcRequest, JsonRpcResponse, NodeKind, RpcNode};
