use btleplug::platform::Manager;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ble_scanner::adapter::{AdapterEvent, BluetoothAdapter};
use ble_scanner::{btle::BtleAdapter, config::Config, server, session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!("Starting BLE scanner");

    let config = Config::from_env()?;

    let manager = Manager::new().await?;
    let adapter = BtleAdapter::select(&manager, config.adapter_index).await?;

    let (tx, rx) = mpsc::channel(256);
    // seed the status bar before the first state callback arrives
    tx.send(AdapterEvent::StateChanged(adapter.adapter_state().await?))
        .await?;

    let pump = adapter.clone();
    tokio::spawn(async move {
        if let Err(e) = pump.pump_events(tx).await {
            error!("Adapter event stream failed: {}", e);
        }
    });

    let session = Arc::new(RwLock::new(session::ScanSession::new(adapter)));
    tokio::spawn(session::drive(session.clone(), rx));

    let app = server::router(session);

    info!("Listening on http://{}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
