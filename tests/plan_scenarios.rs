//! End-to-end planning scenarios against the library API, fully offline.

use ethers::types::{Address, U256};
use evm_sweeper::accounts::{Account, LocalWallet, TokenHolding};
use evm_sweeper::{
    plan_balance_drain, plan_gas_redistribution, plan_token_sweep, Ledger, Pipeline, RpcClient,
    SignedTransfer,
};
use std::collections::HashMap;

const TRANSFER_GAS: u64 = 21_000;

/// Deterministic throwaway account: private key = index + 1.
fn account(index: u8) -> Account {
    let mut key = [0u8; 32];
    key[31] = index + 1;
    let wallet = hex::encode(key).parse::<LocalWallet>().unwrap();
    let mut account = Account::new(wallet);
    account.chain_id = 1;
    account
}

fn token(contract_byte: u8, balance: u64, gas_limit: u64) -> TokenHolding {
    TokenHolding {
        contract: Address::from([contract_byte; 20]),
        balance: U256::from(balance),
        symbol: "TOK".into(),
        decimals: 18,
        gas_limit,
    }
}

fn destination() -> Address {
    Address::from([0xddu8; 20])
}

/// A holds two tokens and no ETH, B holds one token and plenty of ETH,
/// C holds only ETH. The full three-phase plan must fund A, sweep every
/// affordable token, and empty all three accounts.
fn mixed_ledger() -> Ledger {
    let mut a = account(0);
    a.tokens = vec![token(1, 5_000, 40_000), token(2, 80_000, 60_000)];
    a.total_gas_budget = U256::from(100_000u64);

    let mut b = account(1);
    b.balance = U256::from(200_000_000_000u64);
    b.tokens = vec![token(3, 999, 40_000)];
    b.total_gas_budget = U256::from(40_000u64);

    let mut c = account(2);
    c.balance = U256::from(3_000_000_000u64);

    Ledger::new(vec![a, b, c])
}

fn run_all_phases(ledger: Ledger, gas_price: U256) -> (Ledger, Vec<SignedTransfer>) {
    let mut all = Vec::new();
    let (ledger, gas_transfers) = plan_gas_redistribution(ledger, gas_price).unwrap();
    all.extend(gas_transfers);
    let (ledger, token_transfers) = plan_token_sweep(ledger, destination(), gas_price).unwrap();
    all.extend(token_transfers);
    let (ledger, drain_transfers) = plan_balance_drain(ledger, destination(), gas_price).unwrap();
    all.extend(drain_transfers);
    (ledger, all)
}

#[test]
fn three_phases_empty_every_account() {
    let gas_price = U256::from(1_000_000u64);
    let (ledger, transfers) = run_all_phases(mixed_ledger(), gas_price);

    // A was funded: its two token sweeps appear in the plan.
    let token_sweeps: Vec<_> = transfers.iter().filter(|t| t.value.is_zero()).collect();
    assert_eq!(token_sweeps.len(), 3);

    // Everything drainable was drained.
    for account in ledger.accounts() {
        assert!(
            account.balance < U256::from(TRANSFER_GAS) * gas_price,
            "{:?} kept a drainable balance {}",
            account.address,
            account.balance
        );
    }
}

#[test]
fn nonces_are_sequential_per_account_across_phases() {
    let gas_price = U256::from(1_000_000u64);
    let (_, transfers) = run_all_phases(mixed_ledger(), gas_price);

    let mut next_nonce: HashMap<Address, u64> = HashMap::new();
    for transfer in &transfers {
        let expected = next_nonce.entry(transfer.from).or_insert(transfer.nonce);
        assert_eq!(
            transfer.nonce, *expected,
            "nonce gap for {:?}",
            transfer.from
        );
        *expected += 1;
    }
}

#[test]
fn no_transfer_has_zero_meaningful_amount() {
    let gas_price = U256::from(1_000_000u64);
    let (_, transfers) = run_all_phases(mixed_ledger(), gas_price);

    for transfer in &transfers {
        if transfer.value.is_zero() {
            // Deliberate zero-value token call: the amount rides in calldata.
            assert_eq!(transfer.data.len(), 68);
        } else {
            assert!(transfer.data.is_empty());
        }
    }
}

#[test]
fn identical_snapshots_plan_byte_identically() {
    let gas_price = U256::from(1_000_000u64);
    let (_, first) = run_all_phases(mixed_ledger(), gas_price);
    let (_, second) = run_all_phases(mixed_ledger(), gas_price);

    assert_eq!(first.len(), second.len());
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.raw, b.raw);
        assert_eq!(a.hash, b.hash);
    }
}

#[test]
fn redistribution_funds_the_tokenbound_account_first() {
    let gas_price = U256::from(1u64);
    // The spec-level scenario: A has tokens but no ETH, B has ETH to spare.
    let mut a = account(0);
    a.tokens = vec![token(1, 10, 2)];
    a.total_gas_budget = U256::from(2u64);
    let a_address = a.address;

    let mut b = account(1);
    b.balance = U256::from(1_000_000u64);
    let b_address = b.address;

    let (ledger, transfers) =
        plan_gas_redistribution(Ledger::new(vec![a, b]), gas_price).unwrap();

    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].from, b_address);
    assert_eq!(transfers[0].to, a_address);
    assert_eq!(transfers[0].value, U256::from(2u64));

    let b_after = ledger
        .accounts()
        .iter()
        .find(|x| x.address == b_address)
        .unwrap();
    assert_eq!(b_after.balance, U256::from(1_000_000u64 - 2 - 21_000));
}

#[tokio::test]
async fn simulate_mode_runs_all_phases_without_a_node() {
    // The URL points nowhere; in simulate mode it must never be contacted.
    let client = RpcClient::new("http://127.0.0.1:1").unwrap();
    let gas_price = U256::from(1_000_000u64);
    let pipeline = Pipeline::new(client, destination(), gas_price, true);

    let ledger = pipeline.run(mixed_ledger()).await.unwrap();

    // All three phases planned against the in-memory ledger.
    for account in ledger.accounts() {
        assert!(account.balance < U256::from(TRANSFER_GAS) * gas_price);
    }
}
