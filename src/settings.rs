use crate::error::SettingsError;
use anyhow::Result;
use config::{Config, File};
use ethers::types::Address;
use serde::Deserialize;
use std::fmt;

fn default_gas_price_multiplier() -> f64 {
    1.0
}

fn default_number_of_accounts() -> usize {
    3
}

/// Run settings, loaded from a JSON file.
#[derive(Deserialize, Clone)]
pub struct Settings {
    /// Node RPC endpoint.
    pub node_url: String,
    /// Address every swept asset ends up at.
    pub destination_address: String,
    /// Seed phrases to derive source accounts from.
    #[serde(default)]
    pub mnemonics: Vec<String>,
    /// Raw private keys for single source accounts.
    #[serde(default)]
    pub private_keys: Vec<String>,
    /// Multiplier applied to the node's suggested gas price, once per run.
    #[serde(default = "default_gas_price_multiplier")]
    pub gas_price_multiplier: f64,
    /// Report what would be sent without broadcasting anything.
    #[serde(default)]
    pub simulate: bool,
    /// Accounts scanned per derivation level; candidates per phrase is this squared.
    #[serde(default = "default_number_of_accounts")]
    pub number_of_accounts: usize,
    /// Start from the pending nonce instead of the confirmed one.
    #[serde(default)]
    pub pending_nonce: bool,
    /// Override for estimated token transfer gas limits.
    #[serde(default)]
    pub token_transfer_gas_limit: Option<u64>,
}

impl Settings {
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path))
            .build()?;

        settings.try_deserialize().map_err(|e| anyhow::anyhow!(e))
    }

    /// Check the fatal preconditions and return the parsed destination.
    pub fn validate(&self) -> Result<Address, SettingsError> {
        if self.node_url.is_empty() {
            return Err(SettingsError::MissingNodeUrl);
        }

        let destination = self
            .destination_address
            .parse::<Address>()
            .map_err(|_| SettingsError::InvalidDestination {
                address: self.destination_address.clone(),
            })?;

        if self.mnemonics.is_empty() && self.private_keys.is_empty() {
            return Err(SettingsError::NoKeyMaterial);
        }

        Ok(destination)
    }

    /// Token gas limit override, honored only when explicitly set and nonzero.
    pub fn gas_limit_override(&self) -> Option<u64> {
        self.token_transfer_gas_limit.filter(|limit| *limit > 0)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("node_url", &self.node_url)
            .field("destination_address", &self.destination_address)
            .field("mnemonics", &format!("{} redacted", self.mnemonics.len()))
            .field(
                "private_keys",
                &format!("{} redacted", self.private_keys.len()),
            )
            .field("gas_price_multiplier", &self.gas_price_multiplier)
            .field("simulate", &self.simulate)
            .field("number_of_accounts", &self.number_of_accounts)
            .field("pending_nonce", &self.pending_nonce)
            .field("token_transfer_gas_limit", &self.token_transfer_gas_limit)
            .finish()
    }
}
