//! Node-facing collaborators: snapshot queries, token discovery, broadcast
//! and settlement polling.

pub mod client;
pub mod erc20;

pub use client::RpcClient;

/// Gas units for a plain value transfer.
pub const TRANSFER_GAS: u64 = 21_000;

/// Fallback when eth_estimateGas fails for a token transfer.
pub const DEFAULT_TOKEN_TRANSFER_GAS: u64 = 40_000;

/// Estimates run low for tokens with exotic transfer paths; pad them.
pub const ESTIMATE_HEADROOM: f64 = 1.7;

/// Wei step the drain planner backs the gas price off by.
pub const GAS_PRICE_BACKOFF_STEP: u64 = 1_000_000;

/// Seconds to let freshly broadcast transactions propagate before polling.
pub const PROPAGATION_DELAY_SECS: u64 = 2;

/// Settlement polling cadence, roughly one block on mainnet.
pub const SETTLE_POLL_SECS: u64 = 15;
