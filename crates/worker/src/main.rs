//! Shade relay worker entry point.
//!
//! Configuration comes from environment variables; see `WorkerConfig`.
//!
//! ## Initialization Flow
//! 1. Load and validate configuration
//! 2. Initialize tracing
//! 3. Open the keystore and build the proof attestor
//! 4. Register program executors
//! 5. Connect the gateway (HTTP RPC, or in-memory mock for development)
//! 6. Start the relay loop
//! 7. Run until Ctrl+C

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{error, info, Level};

use shade_common::attestor::attestor_for_mode;
use shade_common::config::WorkerConfig;
use shade_common::gateway::Gateway;
use shade_common::keystore::FileKeystore;
use shade_common::mock::MockGateway;
use shade_common::reveal::MemoryRevealStore;
use shade_common::rpc::HttpGateway;

use shade_worker::{DemoExecutor, ExecutorRegistry, Relay};

#[tokio::main]
async fn main() {
    let config = match WorkerConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let level = Level::from_str(&config.log_level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("═══════════════════════════════════════════════════════════════");
    info!("                   Shade Relay Worker                          ");
    info!("═══════════════════════════════════════════════════════════════");
    info!("Worker:       {}", config.worker_account_id);
    info!("Gateway:      {}", config.gateway_contract_id);
    info!("Network:      {}", config.network_id);
    info!("RPC:          {}", config.rpc_url);
    info!("Proof mode:   {}", config.proof_mode);
    info!("Poll:         every {}ms, up to {} jobs", config.poll_interval_ms, config.max_jobs_per_tick);
    info!("═══════════════════════════════════════════════════════════════");

    // Keystore and attestor. In signature mode a missing credentials file
    // only surfaces at first attestation; the directory itself is checked
    // here so obvious misconfiguration fails at startup.
    let keystore = Arc::new(FileKeystore::new(&config.credentials_dir));
    let attestor = match attestor_for_mode(
        config.proof_mode,
        keystore,
        &config.network_id,
        &config.worker_account_id,
        config.mac_secret.as_deref(),
    ) {
        Ok(a) => a,
        Err(e) => {
            error!("Failed to build attestor: {}", e);
            std::process::exit(1);
        }
    };

    let mut programs = ExecutorRegistry::new();
    programs.register(
        &config.demo_program_id,
        Arc::new(DemoExecutor::new(&config.demo_private_secret)),
    );
    info!("Registered program: {}", config.demo_program_id);

    let gateway: Arc<dyn Gateway> = if config.use_mock_gateway {
        info!("Using in-memory mock gateway");
        Arc::new(MockGateway::new(&config.worker_account_id, "client.local"))
    } else {
        Arc::new(HttpGateway::new(&config.rpc_url, &config.gateway_contract_id))
    };

    let shutdown = Arc::new(Notify::new());
    let relay = Arc::new(Relay::new(
        gateway,
        attestor,
        programs,
        Arc::new(MemoryRevealStore::new()),
        Duration::from_millis(config.poll_interval_ms),
        config.max_jobs_per_tick,
        shutdown.clone(),
    ));
    let relay_handle = relay.start();

    info!("Worker running. Press Ctrl+C to shutdown.");
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested..."),
        Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
    }

    shutdown.notify_waiters();
    let _ = relay_handle.await;

    info!("Worker stopped cleanly");
}
