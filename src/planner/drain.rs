//! Balance drain: empty each account's remaining ETH to the destination,
//! backing the gas price off in fixed steps until even dust can move.

use ethers::types::{Address, Bytes, U256};
use tracing::debug;

use crate::error::PlanError;
use crate::planner::{sign_transfer, Ledger, SignedTransfer};
use crate::rpc::{GAS_PRICE_BACKOFF_STEP, TRANSFER_GAS};

/// Plan one balance-emptying transfer per account.
///
/// When the fee at the run's gas price would swallow the whole balance, the
/// price is reduced step by step, trading confirmation speed for the
/// ability to recover dust. An account whose balance cannot beat the fee
/// even as the price approaches zero is left untouched.
pub fn plan_balance_drain(
    mut ledger: Ledger,
    destination: Address,
    gas_price: U256,
) -> Result<(Ledger, Vec<SignedTransfer>), PlanError> {
    let step = U256::from(GAS_PRICE_BACKOFF_STEP);
    let mut transfers = Vec::new();

    for index in 0..ledger.len() {
        let balance = ledger.accounts()[index].balance;
        let Some((price, value)) = drain_quote(balance, gas_price, step) else {
            debug!(
                "{:?} holds only dust ({} wei); not worth draining",
                ledger.accounts()[index].address,
                balance
            );
            continue;
        };

        let transfer = sign_transfer(
            &ledger.accounts()[index],
            destination,
            value,
            TRANSFER_GAS,
            price,
            Bytes::new(),
        )?;

        let account = &mut ledger.accounts_mut()[index];
        account.nonce += 1;
        // value + fee == balance exactly, so the account empties.
        account.balance = U256::zero();
        account.refresh_available(gas_price);
        transfers.push(transfer);
    }

    Ok((ledger, transfers))
}

/// The (gas price, value) pair that empties `balance`, or None when no
/// positive price leaves anything to send. The price only ever decreases,
/// so the loop terminates once it reaches zero.
fn drain_quote(balance: U256, mut price: U256, step: U256) -> Option<(U256, U256)> {
    while price > U256::zero() {
        let fee = price * U256::from(TRANSFER_GAS);
        if balance > fee {
            return Some((price, balance - fee));
        }
        price = price.saturating_sub(step);
    }
    None
}
