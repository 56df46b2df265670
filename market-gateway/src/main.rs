//! Market gateway server binary

use ledger_core::Ledger;
use market_gateway::{app, AppState, GatewayConfig, StaticTokenResolver};
use order_engine::{OrderManager, StockStore};
use reconciler::{
    GatewayKeyPair, InProcessGateway, PaymentReconciler, SignatureVerifier, TracingNotifier,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting HarvestRail market gateway");

    // Load configuration: file takes precedence, env fills the gaps
    let config = match std::env::var("GATEWAY_CONFIG") {
        Ok(path) => GatewayConfig::from_file(path)?,
        Err(_) => GatewayConfig::from_env()?,
    };

    // Open ledger
    let ledger = Arc::new(Ledger::open(config.ledger.clone())?);
    info!("Ledger opened successfully");

    // Stock store with configured seed products
    let stock = Arc::new(StockStore::new());
    config.seed(&stock);

    let manager = Arc::new(OrderManager::new(stock, ledger));

    // Gateway signature verifier
    let verifier = match &config.gateway_public_key {
        Some(hex_key) => SignatureVerifier::from_hex(hex_key)?,
        None => {
            let keypair = GatewayKeyPair::generate();
            tracing::warn!(
                public_key = %keypair.public_key_hex(),
                "No gateway public key configured; generated an ephemeral key pair (local runs only)"
            );
            keypair.verifier()
        }
    };

    let payment_reconciler = Arc::new(PaymentReconciler::new(
        verifier,
        manager.clone(),
        Arc::new(InProcessGateway::new()),
        Arc::new(TracingNotifier),
    ));

    let state = AppState {
        manager,
        reconciler: payment_reconciler,
        auth: Arc::new(StaticTokenResolver::new()),
    };

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Gateway listening on: {}", config.bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down market gateway");
        })
        .await?;

    Ok(())
}
