use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nft_market_observer::codec::address::parse_address;
use nft_market_observer::codec::metadata::{decode_metadata_account, metadata_address};
use nft_market_observer::ledger::LedgerRpc;
use nft_market_observer::ledger::rpc::HttpRpc;
use nft_market_observer::{CollectionIndex, ObserverConfig, Supervisor};

#[derive(Parser)]
#[command(name = "nft-market-observer")]
#[command(about = "Watches NFT marketplace programs and reports listings, delistings and sales")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "observer.toml")]
    config: PathBuf,

    /// Override the RPC endpoint
    #[arg(long)]
    rpc_url: Option<String>,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,

    /// Validate config and datasets, then exit
    #[arg(long)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the configured marketplaces (default)
    Watch,
    /// Fetch and decode the on-ledger metadata of one mint
    InspectMint {
        mint: String,
        /// Text preceding the numeric id in the NFT name
        #[arg(long, default_value = "#")]
        separator: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = if cli.config.exists() {
        ObserverConfig::from_file(&cli.config)?
    } else {
        ObserverConfig::default()
    };
    if let Some(rpc_url) = cli.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }

    init_logging(&config);
    if !cli.config.exists() {
        warn!(path = %cli.config.display(), "config file not found, using defaults");
    }

    config.validate()?;
    let marketplaces = config.resolved_marketplaces()?;
    let index = Arc::new(
        CollectionIndex::load(&config.datasets_dir, &config.datasets)
            .context("failed to load collection datasets")?,
    );
    info!(rpc_url = %config.rpc_url, entries = index.len(), "configuration validated");

    if cli.dry_run {
        info!("dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    let rpc = Arc::new(HttpRpc::new(config.rpc_url.clone())?);

    match cli.command.unwrap_or(Command::Watch) {
        Command::Watch => {
            let watchers = Supervisor::new(rpc, index)
                .with_retry(config.retry_policy())
                .with_max_age(config.max_transaction_age())
                .start(&marketplaces);
            let cancel = watchers.cancellation();

            info!("observer started. Press Ctrl+C to shutdown.");
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result.context("failed to listen for Ctrl+C")?;
                    info!("received shutdown signal");
                }
                () = cancel.cancelled() => {}
            }
            let reported = watchers.shutdown().await;
            info!(reported, "shutdown complete");
        }
        Command::InspectMint { mint, separator } => {
            inspect_mint(rpc.as_ref(), &index, &mint, &separator).await?;
        }
    }
    Ok(())
}

async fn inspect_mint(
    rpc: &dyn LedgerRpc,
    index: &CollectionIndex,
    mint: &str,
    separator: &str,
) -> Result<()> {
    let mint = parse_address(mint)?;
    let address = metadata_address(&mint)?;
    let data = rpc
        .account_data(&address)
        .await?
        .with_context(|| format!("metadata account {address} does not exist"))?;
    let record = decode_metadata_account(&data)?;

    info!(
        %mint,
        metadata = %address,
        name = %record.name,
        symbol = %record.symbol,
        uri = %record.uri,
        seller_fee_basis_points = record.seller_fee_basis_points,
        collection_id = ?record.collection_id(separator),
        "metadata account"
    );
    match index.lookup(&mint) {
        Some(entry) => info!(id = entry.id, name = %entry.name, "indexed"),
        None => info!("mint is not in the loaded datasets"),
    }
    Ok(())
}

fn init_logging(config: &ObserverConfig) {
    let log_level: tracing::Level = config.log_level.parse().unwrap_or(tracing::Level::INFO);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("nft_market_observer={log_level},warn").into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
