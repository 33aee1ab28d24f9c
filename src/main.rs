use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use evm_sweeper::accounts::keys;
use evm_sweeper::{logging, report, Ledger, Pipeline, RpcClient, Settings};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Consolidate funds from many wallets into one destination", long_about = None)]
struct Args {
    /// Path to the JSON run settings.
    #[arg(short, long, default_value = "settings.json")]
    settings: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _log_guard = logging::setup_logger();
    // Keep guard alive for file logging
    std::mem::forget(_log_guard);
    dotenv().ok();

    let args = Args::parse();
    info!("Loading settings from: {}", args.settings);
    let settings = Settings::load(&args.settings).context("failed to load settings")?;
    let destination = settings.validate()?;

    let candidates = keys::collect_accounts(
        &settings.mnemonics,
        &settings.private_keys,
        settings.number_of_accounts,
    )?;
    info!("Derived {} candidate account(s)", candidates.len());

    let client = RpcClient::new(&settings.node_url)?;
    let gas_price = client.gas_price(settings.gas_price_multiplier).await?;
    info!("Gas price for this run: {} Gwei", report::gwei(gas_price));

    let accounts = client
        .snapshot(
            candidates,
            settings.pending_nonce,
            settings.gas_limit_override(),
        )
        .await?;
    if accounts.is_empty() {
        info!("No used accounts found; nothing to consolidate");
        return Ok(());
    }
    info!("{} account(s) hold something to consolidate", accounts.len());

    let ledger = Ledger::new(accounts);
    report::log_snapshot(&ledger, gas_price);

    if settings.simulate {
        info!("Simulate mode: transactions are reported but never broadcast");
    }

    let pipeline = Pipeline::new(client, destination, gas_price, settings.simulate);
    pipeline.run(ledger).await?;

    info!("Consolidation run complete");
    Ok(())
}
