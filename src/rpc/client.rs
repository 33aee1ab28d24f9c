use anyhow::{Context, Result};
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::accounts::{Account, TokenHolding};
use crate::planner::{Ledger, SignedTransfer};
use crate::rpc::erc20::{self, Erc20};
use crate::rpc::{
    DEFAULT_TOKEN_TRANSFER_GAS, ESTIMATE_HEADROOM, PROPAGATION_DELAY_SECS, SETTLE_POLL_SECS,
};

/// Thin wrapper over the node RPC: every network touch point of the run
/// goes through here so the planners stay purely in-memory.
#[derive(Clone, Debug)]
pub struct RpcClient {
    provider: Arc<Provider<Http>>,
}

impl RpcClient {
    pub fn new(url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(url).context("invalid node url")?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }

    /// Suggested gas price scaled by the settings multiplier. Fetched once
    /// per run; every phase plans against the same price.
    pub async fn gas_price(&self, multiplier: f64) -> Result<U256> {
        let suggested = self
            .provider
            .get_gas_price()
            .await
            .context("gas price query failed")?;
        Ok(scale_gas_price(suggested, multiplier))
    }

    /// Chain id of the connected node. A failure here is fatal: signing
    /// with an unset chain id would produce replayable transactions.
    pub async fn chain_id(&self) -> Result<u64> {
        Ok(self
            .provider
            .get_chainid()
            .await
            .context("chain id query failed")?
            .as_u64())
    }

    /// Fill in balance, nonce, chain id and token holdings for every
    /// candidate account, then drop the accounts that were never used on
    /// chain. Individual query failures leave zero/default values and the
    /// run continues.
    pub async fn snapshot(
        &self,
        mut accounts: Vec<Account>,
        pending_nonce: bool,
        gas_limit_override: Option<u64>,
    ) -> Result<Vec<Account>> {
        let chain_id = self.chain_id().await?;

        for account in &mut accounts {
            account.chain_id = chain_id;

            match self.provider.get_balance(account.address, None).await {
                Ok(balance) => account.balance = balance,
                Err(e) => warn!("balance query failed for {:?}: {e}", account.address),
            }

            let nonce_block = if pending_nonce {
                Some(BlockNumber::Pending.into())
            } else {
                None
            };
            match self
                .provider
                .get_transaction_count(account.address, nonce_block)
                .await
            {
                Ok(nonce) => account.nonce = nonce.as_u64(),
                Err(e) => warn!("nonce query failed for {:?}: {e}", account.address),
            }

            self.discover_tokens(account, gas_limit_override).await;
        }

        // Accounts never touched on chain carry nothing worth consolidating.
        accounts.retain(|account| !account.tokens.is_empty() || !account.balance.is_zero());
        Ok(accounts)
    }

    /// Find every token ever sent to the account via the `Transfer` event
    /// log, then resolve balance, metadata and a transfer gas estimate for
    /// each one still held.
    async fn discover_tokens(&self, account: &mut Account, gas_limit_override: Option<u64>) {
        let filter = Filter::new()
            .topic0(erc20::transfer_event_topic())
            .topic2(H256::from(account.address));

        let logs = match self.provider.get_logs(&filter).await {
            Ok(logs) => logs,
            Err(e) => {
                warn!("token log query failed for {:?}: {e}", account.address);
                return;
            }
        };

        let mut contracts: Vec<Address> = logs.into_iter().map(|log| log.address).collect();
        contracts.sort();
        contracts.dedup();

        for contract_address in contracts {
            let token = match Erc20::new(contract_address, self.provider.clone()) {
                Ok(token) => token,
                Err(e) => {
                    warn!("token {contract_address:?} is unusable: {e}");
                    continue;
                }
            };

            let balance = match token.balance_of(account.address).await {
                Ok(balance) => balance,
                Err(_) => continue,
            };
            if balance.is_zero() {
                continue;
            }

            let symbol = token.symbol().await;
            let decimals = token.decimals().await;
            // The override wins only when explicitly configured; otherwise
            // ask the node.
            let gas_limit = match gas_limit_override {
                Some(limit) => limit,
                None => {
                    self.estimate_token_transfer_gas(contract_address, account.address, balance)
                        .await
                }
            };

            account.total_gas_budget += U256::from(gas_limit);
            account.tokens.push(TokenHolding {
                contract: contract_address,
                balance,
                symbol,
                decimals,
                gas_limit,
            });
        }
    }

    async fn estimate_token_transfer_gas(
        &self,
        contract_address: Address,
        owner: Address,
        amount: U256,
    ) -> u64 {
        let call: TypedTransaction = TransactionRequest::new()
            .to(contract_address)
            .data(erc20::transfer_calldata(owner, amount))
            .into();

        let estimated = match self.provider.estimate_gas(&call, None).await {
            Ok(gas) => gas.as_u64(),
            Err(e) => {
                warn!("gas estimate failed for token {contract_address:?}: {e}; using fallback");
                DEFAULT_TOKEN_TRANSFER_GAS
            }
        };

        (estimated as f64 * ESTIMATE_HEADROOM) as u64
    }

    /// Refresh balances from the pending state, keeping the planner's
    /// simulated value for any account whose query fails.
    pub async fn refresh_pending_balances(&self, ledger: &mut Ledger, gas_price: U256) {
        for account in ledger.accounts_mut() {
            match self
                .provider
                .get_balance(account.address, Some(BlockNumber::Pending.into()))
                .await
            {
                Ok(balance) => {
                    account.balance = balance;
                    account.refresh_available(gas_price);
                }
                Err(e) => warn!("pending balance query failed for {:?}: {e}", account.address),
            }
        }
    }

    pub async fn broadcast(&self, transfer: &SignedTransfer) -> Result<()> {
        self.provider
            .send_raw_transaction(transfer.raw.clone())
            .await
            .with_context(|| format!("broadcast failed for {:?}", transfer.hash))?;
        Ok(())
    }

    /// Block until none of the given transactions is still pending.
    ///
    /// No timeout on purpose: every later phase assumes the previous one is
    /// settled, so a permanently stuck transaction must hold the run rather
    /// than let it proceed against stale state.
    pub async fn await_settlement(&self, transfers: &[SignedTransfer]) {
        if transfers.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_secs(PROPAGATION_DELAY_SECS)).await;

        for transfer in transfers {
            loop {
                let mined = match self.provider.get_transaction(transfer.hash).await {
                    Ok(Some(tx)) => tx.block_number.is_some(),
                    Ok(None) => false,
                    Err(e) => {
                        warn!("settlement query failed for {:?}: {e}", transfer.hash);
                        false
                    }
                };
                if mined {
                    break;
                }
                debug!("still pending: {:?}", transfer.hash);
                tokio::time::sleep(Duration::from_secs(SETTLE_POLL_SECS)).await;
            }
        }
    }
}

fn scale_gas_price(suggested: U256, multiplier: f64) -> U256 {
    if multiplier <= 0.0 {
        return suggested;
    }
    // Scale in integer space at 1/1000 resolution; going through f64 would
    // truncate a suggestion wider than its mantissa.
    let per_mille = U256::from((multiplier * 1000.0).round() as u64);
    suggested.saturating_mul(per_mille) / U256::from(1000u64)
}
