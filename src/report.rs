//! Human-readable run reporting, emitted through `tracing`.

use ethers::types::U256;
use ethers::utils::format_units;
use tracing::info;

use crate::planner::{Ledger, SignedTransfer};

/// One line per account and one per held token.
pub fn log_snapshot(ledger: &Ledger, gas_price: U256) {
    for account in ledger.accounts() {
        info!(
            "Address: {:?}, Nonce: {:4}, Sweep Gas Needed: {} ETH, Balance: {} ETH",
            account.address,
            account.nonce,
            eth(account.sweep_cost(gas_price)),
            eth(account.balance)
        );
        for token in &account.tokens {
            info!(
                "    Contract: {:?}, Gas Needed: {} ETH, Balance({:>6}): {}",
                token.contract,
                eth(token.transfer_fee(gas_price)),
                token.symbol,
                token.decimal_balance()
            );
        }
    }
}

/// One line per planned or sent transaction.
pub fn log_transfer(transfer: &SignedTransfer) {
    info!(
        "From: {:?}, Nonce: {:4}, To: {:?}, Gas Limit: {:6}, Gas Price: {} Gwei, Value: {} ETH, TxHash: {:?}, Data: 0x{}",
        transfer.from,
        transfer.nonce,
        transfer.to,
        transfer.gas_limit,
        gwei(transfer.gas_price),
        eth(transfer.value),
        transfer.hash,
        hex::encode(&transfer.data)
    );
}

/// Wei rendered as ETH with 8 decimal places.
pub fn eth(amount: U256) -> String {
    format!("{:.8}", as_f64(amount, "ether"))
}

/// Wei rendered as gwei with 2 decimal places.
pub fn gwei(amount: U256) -> String {
    format!("{:.2}", as_f64(amount, "gwei"))
}

fn as_f64(amount: U256, unit: &str) -> f64 {
    format_units(amount, unit)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}
