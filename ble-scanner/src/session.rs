//! Scan session: the Idle/Scanning state machine that owns the registry.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, info, trace, warn};

use crate::adapter::{AdapterEvent, AdapterState, BluetoothAdapter};
use crate::peripheral::DiscoveredPeripheral;
use crate::registry::DiscoveryRegistry;

pub const READY_TO_SCAN: &str = "Ready to Scan";
pub const NOT_POWERED_ON: &str = "Bluetooth is not powered on";
pub const SCANNING: &str = "Scanning for Devices...";
pub const SCAN_COMPLETE: &str = "Scan Complete";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanState {
    Idle,
    Scanning,
}

/// What the presentation layer shows in its status bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub state: ScanState,
    pub message: String,
    pub adapter_state: AdapterState,
    pub peripheral_count: usize,
}

/// Outcome of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRequest {
    Started,
    AlreadyScanning,
    /// The adapter was not ready; the session stayed idle.
    Rejected(AdapterState),
}

pub struct ScanSession<A> {
    adapter: A,
    registry: DiscoveryRegistry,
    state: ScanState,
    adapter_state: AdapterState,
    message: String,
    status_tx: watch::Sender<SessionStatus>,
}

impl<A: BluetoothAdapter> ScanSession<A> {
    pub fn new(adapter: A) -> Self {
        let status = SessionStatus {
            state: ScanState::Idle,
            message: READY_TO_SCAN.to_string(),
            adapter_state: AdapterState::Unknown,
            peripheral_count: 0,
        };
        let (status_tx, _) = watch::channel(status);

        Self {
            adapter,
            registry: DiscoveryRegistry::new(),
            state: ScanState::Idle,
            adapter_state: AdapterState::Unknown,
            message: READY_TO_SCAN.to_string(),
            status_tx,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn is_scanning(&self) -> bool {
        self.state == ScanState::Scanning
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            message: self.message.clone(),
            adapter_state: self.adapter_state,
            peripheral_count: self.registry.len(),
        }
    }

    /// Receive a fresh [`SessionStatus`] after every change.
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    pub fn registry(&self) -> &DiscoveryRegistry {
        &self.registry
    }

    pub fn snapshot(&self) -> Vec<DiscoveredPeripheral> {
        self.registry.snapshot()
    }

    pub fn peripheral(&self, id: &str) -> Option<&DiscoveredPeripheral> {
        self.registry.get(id)
    }

    /// Start a new scan, discarding the previous session's results.
    ///
    /// An adapter that is not powered on is not an error: the request is
    /// rejected, the status message says so and the session stays idle.
    pub async fn start_scan(&mut self) -> anyhow::Result<ScanRequest> {
        if self.is_scanning() {
            debug!("Already scanning, ignoring start request");
            return Ok(ScanRequest::AlreadyScanning);
        }

        self.adapter_state = self.adapter.adapter_state().await?;
        if !self.adapter_state.is_ready() {
            warn!("Scan rejected, adapter state is {:?}", self.adapter_state);
            self.set_message(NOT_POWERED_ON);
            return Ok(ScanRequest::Rejected(self.adapter_state));
        }

        self.adapter.start_scan().await?;

        self.registry.reset();
        self.state = ScanState::Scanning;
        info!("Scanning for devices");
        self.set_message(SCANNING);

        Ok(ScanRequest::Started)
    }

    /// Stop scanning. Discovered peripherals stay until the next start.
    ///
    /// Always succeeds: an adapter that fails to stop is logged and the
    /// session still ends.
    pub async fn stop_scan(&mut self) -> anyhow::Result<()> {
        if let Err(e) = self.adapter.stop_scan().await {
            warn!("Adapter failed to stop scanning: {}", e);
        }

        self.state = ScanState::Idle;
        info!("Scan complete, {} device(s) found", self.registry.len());
        self.set_message(SCAN_COMPLETE);

        Ok(())
    }

    pub fn handle_event(&mut self, event: AdapterEvent) {
        match event {
            AdapterEvent::Discovered(discovery) => {
                if !self.is_scanning() {
                    trace!("Dropping discovery of {} while idle", discovery.id);
                    return;
                }
                trace!("Discovered {} at {} dBm", discovery.id, discovery.rssi);
                self.registry.ingest(discovery);
                self.publish();
            }
            AdapterEvent::StateChanged(state) => {
                info!("Adapter state changed to {:?}", state);
                self.adapter_state = state;
                if !state.is_ready() && self.is_scanning() {
                    warn!("Adapter no longer powered on, scan ended");
                    self.state = ScanState::Idle;
                }
                self.set_message(state.status_message());
            }
        }
    }

    fn set_message(&mut self, message: &str) {
        self.message = message.to_string();
        self.publish();
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status());
    }
}

/// Apply adapter events to a shared session until the sender side closes.
pub async fn drive<A>(
    session: Arc<RwLock<ScanSession<A>>>,
    mut events: mpsc::Receiver<AdapterEvent>,
) where
    A: BluetoothAdapter,
{
    while let Some(event) = events.recv().await {
        session.write().await.handle_event(event);
    }
    debug!("Adapter event channel closed");
}
