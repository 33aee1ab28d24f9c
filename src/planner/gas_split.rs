//! Gas redistribution: move just enough ETH between accounts so that every
//! account can pay the fees for sweeping its own tokens.

use ethers::types::{Bytes, U256};
use tracing::{debug, warn};

use crate::error::PlanError;
use crate::planner::{sign_transfer, Ledger, SignedTransfer};
use crate::rpc::TRANSFER_GAS;

/// Plan the ETH transfers that fund deficit accounts from surplus accounts.
///
/// Greedy, not globally optimal: deficit accounts are served least-deficient
/// first so as many accounts as possible end up fully funded, each drawing
/// from the richest surplus account that can still give. After every emitted
/// transaction the partition is rebuilt from scratch so the matching always
/// sees fresh balances; each step permanently lifts a deficit account to
/// surplus or exhausts a donor, which bounds the plan at one transaction per
/// account and guarantees termination. Accounts that stay under-funded when
/// no donor is left are logged and later sweep whatever they can afford.
pub fn plan_gas_redistribution(
    mut ledger: Ledger,
    gas_price: U256,
) -> Result<(Ledger, Vec<SignedTransfer>), PlanError> {
    // Flat cost of one funding transfer, burned on top of each amount sent.
    let fee = gas_price * U256::from(TRANSFER_GAS);
    let mut transfers = Vec::new();

    loop {
        ledger.refresh_available(gas_price);
        let Some((donor, recipient, amount)) = find_match(&ledger, gas_price, fee) else {
            break;
        };

        let recipient_address = ledger.accounts()[recipient].address;
        let transfer = sign_transfer(
            &ledger.accounts()[donor],
            recipient_address,
            amount,
            TRANSFER_GAS,
            gas_price,
            Bytes::new(),
        )?;

        let accounts = ledger.accounts_mut();
        accounts[donor].balance -= amount + fee;
        accounts[donor].nonce += 1;
        accounts[recipient].balance += amount;
        debug!(
            "funding {:?} with {} wei from {:?}",
            recipient_address, amount, accounts[donor].address
        );
        transfers.push(transfer);
    }

    for account in ledger.accounts() {
        if account.is_deficit(gas_price) {
            warn!(
                "{:?} remains under-funded; it will sweep what its balance allows",
                account.address
            );
        }
    }

    Ok((ledger, transfers))
}

/// First workable (donor, recipient, amount) triple under the current
/// partition, or None when no pair can make progress.
fn find_match(ledger: &Ledger, gas_price: U256, fee: U256) -> Option<(usize, usize, U256)> {
    let accounts = ledger.accounts();

    let mut deficits: Vec<usize> = Vec::new();
    let mut surpluses: Vec<usize> = Vec::new();
    for (index, account) in accounts.iter().enumerate() {
        if account.is_deficit(gas_price) {
            deficits.push(index);
        } else {
            surpluses.push(index);
        }
    }

    // Highest `available` first, address as the stable tie-break so the
    // plan is a deterministic total order. For deficits (all negative)
    // highest available means least deficient: topping those up first
    // maximizes the number of accounts that end up fully funded.
    let by_available_desc = |a: &usize, b: &usize| {
        accounts[*b]
            .available
            .cmp(&accounts[*a].available)
            .then_with(|| accounts[*a].address.cmp(&accounts[*b].address))
    };
    deficits.sort_by(by_available_desc);
    surpluses.sort_by(by_available_desc);

    for &recipient in &deficits {
        // The full sweep budget, not merely the shortfall: the recipient
        // must afford every token transfer it holds.
        let need = accounts[recipient].sweep_cost(gas_price);
        for &donor in &surpluses {
            let headroom = accounts[donor].headroom(gas_price);
            let amount = if headroom >= need + fee {
                need
            } else if headroom > fee {
                // Donor gives everything it can and lands at exactly zero
                // available; the recipient stays partially served.
                headroom - fee
            } else {
                continue;
            };
            if amount.is_zero() {
                continue;
            }
            return Some((donor, recipient, amount));
        }
    }

    None
}
