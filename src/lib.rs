//! # EVM Sweeper
//!
//! Consolidates funds scattered across many wallets (derived from seed
//! phrases or raw private keys) into a single destination address. The run
//! is planned entirely in memory before anything is broadcast: gas is
//! redistributed so every account can pay for its own token sweep, tokens
//! are swept largest first, and remaining balances are drained with a
//! gas-price back-off that recovers dust.
//!
//! ## Modules
//!
//! - [`accounts`] - Account model and key derivation
//! - [`error`] - Typed error handling with thiserror
//! - [`logging`] - tracing subscriber setup
//! - [`pipeline`] - Phase sequencing with broadcast/confirm in between
//! - [`planner`] - Ledger simulation and the three planning phases
//! - [`report`] - Per-account and per-transaction report lines
//! - [`rpc`] - Node RPC wrapper (snapshot, discovery, broadcast)
//! - [`settings`] - JSON run settings

pub mod accounts;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod planner;
pub mod report;
pub mod rpc;
pub mod settings;

pub use accounts::{Account, TokenHolding};
pub use error::{KeyError, PlanError, SettingsError};
pub use pipeline::Pipeline;
pub use planner::{
    plan_balance_drain, plan_gas_redistribution, plan_token_sweep, Ledger, SignedTransfer,
};
pub use rpc::RpcClient;
pub use settings::Settings;
