//! Token sweep: one ERC-20 transfer per affordable token, largest holdings
//! first so the most value escapes if an account runs out of ETH mid-loop.

use ethers::types::{Address, U256};
use tracing::{debug, warn};

use crate::error::PlanError;
use crate::planner::{sign_transfer, Ledger, SignedTransfer};
use crate::rpc::erc20;

/// Plan the token transfers moving every affordable holding to the
/// destination. A token whose transfer fee exceeds the account's remaining
/// ETH is left behind without failing the account or the run, and a
/// signing failure skips just that token.
pub fn plan_token_sweep(
    mut ledger: Ledger,
    destination: Address,
    gas_price: U256,
) -> Result<(Ledger, Vec<SignedTransfer>), PlanError> {
    let mut transfers = Vec::new();

    for index in 0..ledger.len() {
        // Largest balance first; contract address keeps ties stable.
        ledger.accounts_mut()[index]
            .tokens
            .sort_by(|a, b| b.balance.cmp(&a.balance).then(a.contract.cmp(&b.contract)));

        for token_index in 0..ledger.accounts()[index].tokens.len() {
            let (contract, amount, gas_limit, fee) = {
                let token = &ledger.accounts()[index].tokens[token_index];
                (
                    token.contract,
                    token.balance,
                    token.gas_limit,
                    token.transfer_fee(gas_price),
                )
            };

            if ledger.accounts()[index].balance < fee {
                debug!(
                    "{:?} cannot afford to move token {:?}; leaving it behind",
                    ledger.accounts()[index].address,
                    contract
                );
                continue;
            }

            let data = erc20::transfer_calldata(destination, amount);
            // A zero-value call to the token contract; the amount rides in
            // the calldata.
            match sign_transfer(
                &ledger.accounts()[index],
                contract,
                U256::zero(),
                gas_limit,
                gas_price,
                data,
            ) {
                Ok(transfer) => {
                    let account = &mut ledger.accounts_mut()[index];
                    account.nonce += 1;
                    account.balance -= fee;
                    account.refresh_available(gas_price);
                    transfers.push(transfer);
                }
                Err(PlanError::Signing {
                    address, reason, ..
                }) => {
                    warn!("skipping token {contract:?} on {address:?}: {reason}");
                }
                Err(e) => return Err(e),
            }
        }
    }

    Ok((ledger, transfers))
}
