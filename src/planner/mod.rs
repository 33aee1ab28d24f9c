//! The in-memory ledger simulation and the three planning phases.
//!
//! Each planner consumes the [`Ledger`] by value and returns the updated
//! ledger alongside the transactions it emitted, so account state is never
//! aliased across phases and every plan is a pure function of the snapshot
//! it started from. Nothing here touches the network; the signed raw bytes
//! are handed to the pipeline for broadcast.

pub mod drain;
pub mod gas_split;
pub mod token_sweep;

pub use drain::plan_balance_drain;
pub use gas_split::plan_gas_redistribution;
pub use token_sweep::plan_token_sweep;

use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, H256, U256};
use ethers::utils::keccak256;

use crate::accounts::Account;
use crate::error::PlanError;

/// The account set threaded through the planning phases by exclusive
/// ownership. Balances and nonces in here simulate the effect of planned
/// transactions before anything is broadcast.
#[derive(Debug)]
pub struct Ledger {
    accounts: Vec<Account>,
}

impl Ledger {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn accounts_mut(&mut self) -> &mut [Account] {
        &mut self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Recompute every account's `available` scratch value at this price.
    pub fn refresh_available(&mut self, gas_price: U256) {
        for account in &mut self.accounts {
            account.refresh_available(gas_price);
        }
    }
}

/// A signed transaction together with the account that originates and pays
/// for it. Immutable once created; list order is broadcast order and is
/// nonce-consistent per originating address.
#[derive(Clone, Debug)]
pub struct SignedTransfer {
    pub from: Address,
    pub nonce: u64,
    pub to: Address,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub value: U256,
    pub data: Bytes,
    /// RLP-encoded signed transaction, ready for eth_sendRawTransaction.
    pub raw: Bytes,
    pub hash: H256,
}

/// Sign a legacy transfer from `account` at its current nonce.
///
/// The account's chain id must be set; zero would sign an EIP-155
/// transaction valid under an unintended replay policy.
pub(crate) fn sign_transfer(
    account: &Account,
    to: Address,
    value: U256,
    gas_limit: u64,
    gas_price: U256,
    data: Bytes,
) -> Result<SignedTransfer, PlanError> {
    if account.chain_id == 0 {
        return Err(PlanError::MissingChainId {
            address: account.address,
        });
    }

    let mut request = TransactionRequest::new()
        .from(account.address)
        .to(to)
        .value(value)
        .gas(gas_limit)
        .gas_price(gas_price)
        .nonce(account.nonce)
        .chain_id(account.chain_id);
    if !data.is_empty() {
        request = request.data(data.clone());
    }

    let tx: TypedTransaction = request.into();
    let signature = account.sign_sync(&tx).map_err(|e| PlanError::Signing {
        address: account.address,
        nonce: account.nonce,
        reason: e.to_string(),
    })?;
    let raw = tx.rlp_signed(&signature);
    let hash = H256::from(keccak256(&raw));

    Ok(SignedTransfer {
        from: account.address,
        nonce: account.nonce,
        to,
        gas_limit,
        gas_price,
        value,
        data,
        raw,
        hash,
    })
}


#[cfg(test)]
mod tests {
    use super::testutil::test_account;
    use super::*;

    #[test]
    fn signing_without_chain_id_is_refused() {
        let mut account = test_account(0);
        account.chain_id = 0;
        let result = sign_transfer(
            &account,
            Address::zero(),
            U256::one(),
            21_000,
            U256::one(),
            Bytes::new(),
        );
        assert!(matches!(result, Err(PlanError::MissingChainId { .. })));
    }

    #[test]
    fn signed_transfer_carries_the_planned_fields() {
        let mut account = test_account(0);
        account.nonce = 7;
        let to = test_account(1).address;

        let transfer = sign_transfer(
            &account,
            to,
            U256::from(1_000u64),
            21_000,
            U256::from(5u64),
            Bytes::new(),
        )
        .unwrap();

        assert_eq!(transfer.from, account.address);
        assert_eq!(transfer.nonce, 7);
        assert_eq!(transfer.to, to);
        assert_eq!(transfer.gas_limit, 21_000);
        assert_eq!(transfer.gas_price, U256::from(5u64));
        assert_eq!(transfer.value, U256::from(1_000u64));
        assert!(transfer.data.is_empty());
        assert!(!transfer.raw.is_empty());
        assert_eq!(transfer.hash, H256::from(keccak256(&transfer.raw)));
    }

    #[test]
    fn identical_inputs_sign_identically() {
        let account = test_account(2);
        let to = test_account(3).address;
        let a = sign_transfer(&account, to, U256::one(), 21_000, U256::one(), Bytes::new())
            .unwrap();
        let b = sign_transfer(&account, to, U256::one(), 21_000, U256::one(), Bytes::new())
            .unwrap();
        assert_eq!(a.raw, b.raw);
        assert_eq!(a.hash, b.hash);
    }
}
