//! Account snapshot model: per-account balance, nonce and token holdings,
//! plus the planning-only `available` scratch value the planners sort on.

pub mod keys;

use ethers::signers::{Signer, WalletError};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Signature, I256, U256};
use std::fmt;

pub use ethers::signers::LocalWallet;

/// A fungible token held by an account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenHolding {
    pub contract: Address,
    /// Raw balance in the token's own units.
    pub balance: U256,
    pub symbol: String,
    /// For display only; transfers always move raw units.
    pub decimals: u8,
    /// Estimated gas units to transfer this token out of this account.
    pub gas_limit: u64,
}

impl TokenHolding {
    /// Fee to move this token out at the given gas price.
    pub fn transfer_fee(&self, gas_price: U256) -> U256 {
        gas_price * U256::from(self.gas_limit)
    }

    /// Balance adjusted by the token's decimals, for reporting.
    pub fn decimal_balance(&self) -> String {
        ethers::utils::format_units(self.balance, u32::from(self.decimals))
            .unwrap_or_else(|_| self.balance.to_string())
    }
}

/// One source account: identity, exclusive signing capability and the
/// snapshot state the planners mutate in place to simulate transactions
/// that have not been broadcast yet.
#[derive(Clone)]
pub struct Account {
    wallet: LocalWallet,
    pub address: Address,
    pub balance: U256,
    pub nonce: u64,
    pub chain_id: u64,
    pub tokens: Vec<TokenHolding>,
    /// Sum of the per-token transfer gas estimates, accumulated at discovery.
    pub total_gas_budget: U256,
    /// Balance minus the fee to sweep all own tokens; negative means the
    /// account cannot pay for its own sweep. Scratch value, recomputed
    /// whenever balance or gas price changes.
    pub available: I256,
}

impl Account {
    pub fn new(wallet: LocalWallet) -> Self {
        let address = wallet.address();
        Self {
            wallet,
            address,
            balance: U256::zero(),
            nonce: 0,
            chain_id: 0,
            tokens: Vec::new(),
            total_gas_budget: U256::zero(),
            available: I256::zero(),
        }
    }

    /// Fee to sweep every token this account holds at the given gas price.
    pub fn sweep_cost(&self, gas_price: U256) -> U256 {
        gas_price * self.total_gas_budget
    }

    /// True when the account cannot pay to sweep its own tokens.
    pub fn is_deficit(&self, gas_price: U256) -> bool {
        self.balance < self.sweep_cost(gas_price)
    }

    /// Balance left over after the sweep cost, clamped at zero.
    pub fn headroom(&self, gas_price: U256) -> U256 {
        self.balance.saturating_sub(self.sweep_cost(gas_price))
    }

    pub fn refresh_available(&mut self, gas_price: U256) {
        self.available = signed(self.balance).saturating_sub(signed(self.sweep_cost(gas_price)));
    }

    /// Sign a fully specified transaction with this account's own key.
    pub fn sign_sync(&self, tx: &TypedTransaction) -> Result<Signature, WalletError> {
        self.wallet.sign_transaction_sync(tx)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("balance", &self.balance)
            .field("nonce", &self.nonce)
            .field("chain_id", &self.chain_id)
            .field("tokens", &self.tokens)
            .field("total_gas_budget", &self.total_gas_budget)
            .field("available", &self.available)
            .field("wallet", &"***REDACTED***")
            .finish()
    }
}

fn signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}
