//! Supported chains, family classification, and manifest slugs.
//!
//! The [`Network`] enum is the closed set of chains the SDK dispatches for.
//! Each network belongs to a [`ChainFamily`]; the family decides which status
//! payload the health probe sends and whether the chain participates in load
//! balancing at all. Families without a status codec (XRP, Solana, Tezos,
//! Stellar) are served through their own HTTP surfaces and must not be routed
//! through the balancer's probe loop.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum Network {
    // UTXO family
    Bitcoin,
    BitcoinCash,
    Dogecoin,
    Litecoin,
    // EVM family
    ArbitrumOne,
    AvalancheC,
    Base,
    Bsc,
    Celo,
    Ethereum,
    EthereumSepolia,
    Optimism,
    Polygon,
    // EVM probe surface, Tron semantics elsewhere
    Tron,
    // No balancer participation
    Solana,
    Stellar,
    Tezos,
    Xrp,
}

/// Chain family, deciding probe encoding and balancer participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainFamily {
    /// Bitcoin-like chains probed with `getblockcount`.
    Utxo,
    /// Ethereum-like chains probed with `eth_blockNumber`.
    Evm,
    /// Tron exposes an EVM-compatible JSON-RPC surface for probing.
    Tron,
    /// XRP Ledger; not load balanced.
    Xrp,
    /// Solana; not load balanced.
    Solana,
    /// Tezos; not load balanced.
    Tezos,
    /// Stellar; not load balanced.
    Stellar,
}

impl ChainFamily {
    /// Whether chains of this family are subject to load balancing.
    ///
    /// Families without a status payload codec cannot be health probed, so
    /// they never enter the balancer.
    #[must_use]
    pub fn supports_load_balancing(self) -> bool {
        matches!(self, ChainFamily::Utxo | ChainFamily::Evm | ChainFamily::Tron)
    }
}

/// Manifest slug overrides for networks whose manifest path segment differs
/// from the network identifier. Everything else falls back to [`Network::as_str`].
const MANIFEST_SLUGS: &[(Network, &str)] = &[
    (Network::ArbitrumOne, "arb-one"),
    (Network::AvalancheC, "avax"),
    (Network::BitcoinCash, "bch"),
    (Network::Ethereum, "ethereum-mainnet"),
    (Network::EthereumSepolia, "ethereum-sepolia"),
    (Network::Tron, "tron-mainnet"),
];

impl Network {
    /// The family this network belongs to.
    #[must_use]
    pub fn family(self) -> ChainFamily {
        match self {
            Network::Bitcoin | Network::BitcoinCash | Network::Dogecoin | Network::Litecoin => {
                ChainFamily::Utxo
            }
            Network::ArbitrumOne |
            Network::AvalancheC |
            Network::Base |
            Network::Bsc |
            Network::Celo |
            Network::Ethereum |
            Network::EthereumSepolia |
            Network::Optimism |
            Network::Polygon => ChainFamily::Evm,
            Network::Tron => ChainFamily::Tron,
            Network::Xrp => ChainFamily::Xrp,
            Network::Solana => ChainFamily::Solana,
            Network::Tezos => ChainFamily::Tezos,
            Network::Stellar => ChainFamily::Stellar,
        }
    }

    /// Whether this network participates in load balancing.
    #[must_use]
    pub fn supports_load_balancing(self) -> bool {
        self.family().supports_load_balancing()
    }

    /// Canonical lowercase identifier, as used in logs and manifest paths.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Network::Bitcoin => "bitcoin",
            Network::BitcoinCash => "bitcoin-cash",
            Network::Dogecoin => "dogecoin",
            Network::Litecoin => "litecoin",
            Network::ArbitrumOne => "arbitrum-one",
            Network::AvalancheC => "avalanche-c",
            Network::Base => "base",
            Network::Bsc => "bsc",
            Network::Celo => "celo",
            Network::Ethereum => "ethereum",
            Network::EthereumSepolia => "ethereum-sepolia",
            Network::Optimism => "optimism",
            Network::Polygon => "polygon",
            Network::Tron => "tron",
            Network::Solana => "solana",
            Network::Stellar => "stellar",
            Network::Tezos => "tezos",
            Network::Xrp => "xrp",
        }
    }

    /// Manifest path segment for this network.
    ///
    /// Looked up in the static override table, falling back to the network
    /// identifier itself. The archive manifest appends `-archive` to this slug.
    #[must_use]
    pub fn manifest_slug(self) -> &'static str {
        MANIFEST_SLUGS
            .iter()
            .find(|(network, _)| *network == self)
            .map_or_else(|| self.as_str(), |&(_, slug)| slug)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
