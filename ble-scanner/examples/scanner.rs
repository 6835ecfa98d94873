use btleplug::platform::Manager;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time;
use tracing::error;

use ble_scanner::btle::BtleAdapter;
use ble_scanner::config::Config;
use ble_scanner::session::{self, ScanRequest, ScanSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    println!("Starting BLE scanner...\n");

    let config = Config::from_env()?;
    let manager = Manager::new().await?;
    let adapter = BtleAdapter::select(&manager, config.adapter_index).await?;

    let (tx, rx) = mpsc::channel(256);
    let pump = adapter.clone();
    tokio::spawn(async move {
        if let Err(e) = pump.pump_events(tx).await {
            error!("Adapter event stream failed: {}", e);
        }
    });

    let session = Arc::new(RwLock::new(ScanSession::new(adapter)));
    tokio::spawn(session::drive(session.clone(), rx));

    if let ScanRequest::Rejected(state) = session.write().await.start_scan().await? {
        println!("❌ {}", state.status_message());
        return Ok(());
    }

    println!(
        "Scanning for {} seconds...\n",
        config.scan_duration.as_secs()
    );
    time::sleep(config.scan_duration).await;

    let mut session = session.write().await;
    session.stop_scan().await?;

    let peripherals = session.snapshot();
    println!("Found {} device(s):\n", peripherals.len());

    for (i, p) in peripherals.iter().enumerate() {
        println!("Device {}: {}", i + 1, p.name);
        println!("  ID: {}", p.id);
        println!("  RSSI: {} dBm ({})", p.rssi, p.strength().label());
        println!("  Services: {}", p.services_label());
        if let Some(hex) = p.manufacturer_hex() {
            println!("  Manufacturer Data: {}", hex);
        }
        println!();
    }

    Ok(())
}
