//! RPS Escrow dev node binary.

use rps_escrow_node::{create_router, AppState, NodeConfig};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(err) = run().await {
        tracing::error!("rps-escrow-node failed: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = NodeConfig::from_env()?;
    tracing::info!("Token {}, escrow account {}", config.token, config.escrow);

    let app = create_router(AppState::new(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("RPS escrow node starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
