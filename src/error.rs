//! # Error Types
//!
//! Centralized error definitions for the sweeper. Configuration and key
//! errors are fatal before any planning starts; plan errors abort the run
//! mid-flight except where a planner explicitly downgrades them.

use ethers::types::Address;
use thiserror::Error;

/// Run-settings validation errors. All of these abort before planning.
#[derive(Error, Debug, Clone)]
pub enum SettingsError {
    #[error("node_url is required")]
    MissingNodeUrl,

    #[error("destination_address '{address}' is not a valid address")]
    InvalidDestination { address: String },

    #[error("no key material: supply at least one mnemonic or private key")]
    NoKeyMaterial,
}

/// Key derivation and import errors.
#[derive(Error, Debug, Clone)]
pub enum KeyError {
    #[error("invalid mnemonic: {reason}")]
    InvalidMnemonic { reason: String },

    #[error("invalid private key: {reason}")]
    InvalidPrivateKey { reason: String },

    #[error("derivation failed at {path}: {reason}")]
    Derivation { path: String, reason: String },
}

/// Errors raised while turning ledger state into signed transactions.
#[derive(Error, Debug, Clone)]
pub enum PlanError {
    #[error("account {address:?} has no chain id; refusing to sign a replayable transaction")]
    MissingChainId { address: Address },

    #[error("signing failed for {address:?} at nonce {nonce}: {reason}")]
    Signing {
        address: Address,
        nonce: u64,
        reason: String,
    },
}
