//! bookie-ledger command line.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────────┐
//!                 │                       AppContext                          │
//!  config (TOML)  │  ┌────────┐   ┌─────────┐   ┌────────┐   ┌───────────┐   │
//!  + BOOKIE_* ────┼─▶│  mode  │──▶│ builder │──▶│ signer │──▶│ submitter │───┼──▶ Soroban RPC
//!                 │  └────────┘   └─────────┘   └────────┘   └─────┬─────┘   │      (Horizon
//!                 │                                                │         │       fallback)
//!                 │                                          ┌─────▼─────┐   │
//!                 │                                          │  poller   │───┼──▶ getTransaction
//!                 │                                          └─────┬─────┘   │
//!                 │                                          ┌─────▼─────┐   │
//!                 │                                          │   cache   │   │
//!                 │                                          └───────────┘   │
//!                 └──────────────────────────────────────────────────────────┘
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use bookie_ledger::context::AppContext;
use bookie_ledger::ledger::builder::OperationPayload;
use bookie_ledger::ledger::signer::{LocalSigner, SIGNING_KEY_ENV_VAR};
use bookie_ledger::ledger::traits::Signer;
use bookie_ledger::lifecycle::signals::spawn_ctrl_c_listener;
use bookie_ledger::lifecycle::startup::bootstrap;
use bookie_ledger::lifecycle::Shutdown;
use bookie_ledger::marketplace::catalog::find_sample_asset;

#[derive(Parser)]
#[command(name = "bookie-ledger")]
#[command(about = "Transaction client for the Bookie data marketplace on Stellar", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level for this crate (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the transaction mode and why it was chosen
    Mode,
    /// Check endpoints and, optionally, an account
    Diagnose {
        #[arg(long)]
        account: Option<String>,
    },
    /// List a data asset for sale
    ListAsset {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        data_type: String,
        #[arg(long)]
        price: i128,
        #[arg(long)]
        ipfs_cid: String,
        #[arg(long)]
        size: String,
    },
    /// Purchase a data asset
    Purchase {
        #[arg(long)]
        asset_id: String,
        /// Defaults to the sample catalogue price for known assets
        #[arg(long)]
        price: Option<i128>,
    },
    /// Request access to a kind of data
    CreateRequest {
        #[arg(long)]
        data_type: String,
        #[arg(long)]
        price: i128,
        #[arg(long)]
        duration_days: u32,
    },
    /// Approve a data-access request by index
    ApproveRequest {
        #[arg(long)]
        index: u32,
    },
    /// Poll a transaction until it is final
    Status { tx_id: String },
    /// List data-access requests
    Requests,
    /// Show cached listings and purchases for an account
    Cache { account: String },
}

fn load_signer(ctx: &AppContext) -> Result<LocalSigner, Box<dyn std::error::Error>> {
    match LocalSigner::from_env() {
        Ok(signer) => Ok(signer),
        Err(_) if ctx.mode().is_mock() => {
            tracing::info!("{} not set; using an ephemeral key in mock mode", SIGNING_KEY_ENV_VAR);
            Ok(LocalSigner::ephemeral())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run_operation(
    ctx: &AppContext,
    shutdown: &Shutdown,
    payload: OperationPayload,
) -> Result<(), Box<dyn std::error::Error>> {
    let signer = load_signer(ctx)?;
    let op = ctx.builder().prepare(signer.account_id(), payload);

    let outcome = ctx
        .workflow()
        .execute(&op, &signer, shutdown.child_token())
        .await?;

    if let Err(e) = ctx.cache().save_to_file() {
        tracing::warn!(error = %e, "Failed to save asset cache");
    }
    print_json(&outcome)?;

    if !outcome.is_success() {
        return Err(format!("transaction {} failed", outcome.transaction_id).into());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let ctx = bootstrap(cli.config.as_deref(), cli.log_level.as_deref())?;

    let shutdown = Shutdown::new();
    let signals = spawn_ctrl_c_listener(shutdown.clone());

    let result = match cli.command {
        Commands::Mode => print_json(ctx.mode_decision()),
        Commands::Diagnose { account } => print_json(&ctx.diagnose(account.as_deref()).await),
        Commands::ListAsset {
            title,
            description,
            data_type,
            price,
            ipfs_cid,
            size,
        } => {
            let payload = OperationPayload::ListAsset {
                title,
                description,
                data_type,
                price,
                ipfs_cid,
                size,
            };
            run_operation(&ctx, &shutdown, payload).await
        }
        Commands::Purchase { asset_id, price } => {
            match price.or_else(|| find_sample_asset(&asset_id).map(|a| a.price)) {
                Some(price) => {
                    let payload = OperationPayload::PurchaseAsset { asset_id, price };
                    run_operation(&ctx, &shutdown, payload).await
                }
                None => Err(format!("--price is required for unknown asset '{}'", asset_id).into()),
            }
        }
        Commands::CreateRequest {
            data_type,
            price,
            duration_days,
        } => {
            let payload = OperationPayload::CreateRequest {
                data_type,
                price,
                duration_days,
            };
            run_operation(&ctx, &shutdown, payload).await
        }
        Commands::ApproveRequest { index } => {
            run_operation(&ctx, &shutdown, OperationPayload::ApproveRequest { index }).await
        }
        Commands::Status { tx_id } => ctx
            .poller()
            .watch(&tx_id, shutdown.child_token(), |update| {
                if let Err(e) = print_json(update) {
                    tracing::warn!(error = %e, "Failed to print status update");
                }
            })
            .await
            .map(|_| ())
            .map_err(Into::into),
        Commands::Requests => match ctx.catalog().list_data_requests().await {
            Ok(requests) => print_json(&requests),
            Err(e) => Err(e.into()),
        },
        Commands::Cache { account } => print_json(&ctx.cache().records(&account)),
    };

    shutdown.trigger();
    let _ = signals.await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Command failed");
    }
    result
}
