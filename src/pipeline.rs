//! Phase sequencing: plan, report, broadcast, await settlement, repeat.

use anyhow::Result;
use ethers::types::{Address, U256};
use tracing::{error, info};

use crate::planner::{
    plan_balance_drain, plan_gas_redistribution, plan_token_sweep, Ledger, SignedTransfer,
};
use crate::report;
use crate::rpc::RpcClient;

/// Runs the three planning phases in order, pushing each phase's
/// transactions out and waiting for settlement before the next phase plans
/// on top of them. In simulate mode every phase still plans and reports,
/// but nothing leaves the process and no settlement is awaited.
pub struct Pipeline {
    client: RpcClient,
    destination: Address,
    gas_price: U256,
    simulate: bool,
}

impl Pipeline {
    pub fn new(client: RpcClient, destination: Address, gas_price: U256, simulate: bool) -> Self {
        Self {
            client,
            destination,
            gas_price,
            simulate,
        }
    }

    pub async fn run(&self, ledger: Ledger) -> Result<Ledger> {
        let (ledger, gas_transfers) = plan_gas_redistribution(ledger, self.gas_price)?;
        info!("gas redistribution: {} transaction(s)", gas_transfers.len());
        self.dispatch(&gas_transfers).await;

        let (ledger, token_transfers) =
            plan_token_sweep(ledger, self.destination, self.gas_price)?;
        info!("token sweep: {} transaction(s)", token_transfers.len());
        self.dispatch(&token_transfers).await;

        let mut ledger = ledger;
        if self.simulate {
            if !token_transfers.is_empty() {
                info!(
                    "drain amounts below may change once the token transfers are actually mined"
                );
            }
        } else {
            // Drain must see the fees the mined sweeps really debited, not
            // the planner's simulation of them.
            self.client
                .refresh_pending_balances(&mut ledger, self.gas_price)
                .await;
        }

        let (ledger, drain_transfers) =
            plan_balance_drain(ledger, self.destination, self.gas_price)?;
        info!("balance drain: {} transaction(s)", drain_transfers.len());
        self.dispatch(&drain_transfers).await;

        Ok(ledger)
    }

    /// Report every transfer, then broadcast and await settlement unless
    /// simulating. A failed broadcast is logged and the run moves on; there
    /// is no retry.
    async fn dispatch(&self, transfers: &[SignedTransfer]) {
        for transfer in transfers {
            report::log_transfer(transfer);
            if self.simulate {
                continue;
            }
            if let Err(e) = self.client.broadcast(transfer).await {
                error!("{e:#}");
            }
        }
        if !self.simulate {
            self.client.await_settlement(transfers).await;
        }
    }
}
