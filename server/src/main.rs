//! The mixing relayer server: wires the Vault, Swap Registry, Recovery
//! Ledger, Mixing Coordinator, Deposit Monitor, and Control Surface together
//! and serves the Control Surface over HTTP until `SIGINT`/`SIGTERM`.

mod admitter;

use std::sync::Arc;

use anyhow::Context;
use relayer_chain::rpc::RpcClientAdapter;
use relayer_core::clock::SystemClock;
use relayer_core::config::{Cli, Config};
use relayer_core::shutdown::ShutdownChannel;
use relayer_coordinator::{MixingCoordinator, StrategyProfile, Treasury};
use relayer_ledger::RecoveryLedger;
use relayer_monitor::DepositMonitor;
use relayer_registry::Registry;
use relayer_vault::{MasterKey, PgWalletStore, Vault};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Keypair;
use sqlx::postgres::PgPoolOptions;

use crate::admitter::CoordinatorAdmitter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli: Cli = argh::from_env();
    let config = Config::load(&cli).context("failed to load configuration")?;

    init_tracing();
    tracing::info!(network = %config.network, bind_addr = %config.bind_addr, "starting relayer-server");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    let master_key = MasterKey::from_hex(&config.master_key_hex)
        .context("invalid RELAYER_MASTER_KEY_HEX")?;
    let rpc = Arc::new(RpcClientAdapter::new(config.solana_rpc_url.clone()));
    let clock = Arc::new(SystemClock);

    let wallet_store = Arc::new(PgWalletStore::from_pool(pool.clone()));
    let registry = Arc::new(Registry::from_pool(pool.clone()));
    let ledger = Arc::new(RecoveryLedger::from_pool(pool.clone()));
    let vault = Arc::new(Vault::new(master_key, Arc::clone(&rpc), wallet_store));

    let treasury = config
        .treasury_secret_key_base58
        .as_deref()
        .map(Keypair::from_base58_string)
        .map(|keypair| Arc::new(Treasury::new(keypair, Arc::clone(&rpc))));

    let fee_wallet_pubkey: Option<Pubkey> = config
        .fee_wallet_pubkey_base58
        .as_deref()
        .map(|s| s.parse())
        .transpose()
        .context("invalid RELAYER_FEE_WALLET_PUBKEY")?;

    if let Some(treasury) = &treasury {
        tracing::info!(treasury_pubkey = %treasury.pubkey(), "treasury capability enabled");
    }

    let coordinator = Arc::new(MixingCoordinator::new(
        Arc::clone(&vault),
        Arc::clone(&registry),
        Arc::clone(&ledger),
        Arc::clone(&clock) as Arc<dyn relayer_core::clock::Clock>,
        StrategyProfile::standard(),
        treasury,
        fee_wallet_pubkey,
    ));

    let shutdown = ShutdownChannel::new();

    let admitter = Arc::new(CoordinatorAdmitter::new(Arc::clone(&registry), Arc::clone(&coordinator)));
    let monitor = Arc::new(DepositMonitor::new(
        Arc::clone(&rpc),
        Arc::clone(&vault),
        Arc::clone(&registry),
        admitter,
    ));
    let monitor_shutdown = shutdown.clone();
    let monitor_task = tokio::spawn({
        let monitor = Arc::clone(&monitor);
        async move { monitor.run(&monitor_shutdown).await }
    });

    let state = relayer_api::AppState {
        vault,
        registry,
        ledger,
        coordinator,
        clock: Arc::clone(&clock) as Arc<dyn relayer_core::clock::Clock>,
        network: config.network,
    };
    let app = relayer_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "control surface listening");

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_termination().await;
        tracing::info!("termination signal received, shutting down");
        signal_shutdown.send();
    });

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { server_shutdown.recv().await })
        .await
        .context("axum server error")?;

    shutdown.send();
    let _ = monitor_task.await;
    tracing::info!("relayer-server shut down cleanly");
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_termination() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(unix)]
async fn wait_for_termination() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
