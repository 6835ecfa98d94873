//! Scripted adapter shared by the integration tests.

#![allow(dead_code)]

use ble_scanner::adapter::{AdapterState, BluetoothAdapter};
use ble_scanner::peripheral::{AdvertisementData, AdvertisementValue, DiscoveryEvent};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

#[derive(Clone)]
pub struct FakeAdapter {
    state: Arc<Mutex<AdapterState>>,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
    fail_stop: Arc<AtomicBool>,
}

impl FakeAdapter {
    pub fn new(state: AdapterState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            starts: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
            fail_stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every later `stop_scan` call return an error.
    pub fn fail_stops(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    pub fn set_state(&self, state: AdapterState) {
        *self.state.lock().unwrap() = state;
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl BluetoothAdapter for FakeAdapter {
    async fn adapter_state(&self) -> anyhow::Result<AdapterState> {
        Ok(*self.state.lock().unwrap())
    }

    async fn start_scan(&self) -> anyhow::Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_scan(&self) -> anyhow::Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            anyhow::bail!("adapter refused to stop");
        }
        Ok(())
    }
}

pub fn discovery(id: &str, name: &str, rssi: i16) -> DiscoveryEvent {
    DiscoveryEvent {
        id: id.to_string(),
        name: Some(name.to_string()),
        rssi,
        advertisement_data: AdvertisementData::new(),
    }
}

pub fn with_entry(mut event: DiscoveryEvent, key: &str, value: AdvertisementValue) -> DiscoveryEvent {
    event.advertisement_data.insert(key.to_string(), value);
    event
}
