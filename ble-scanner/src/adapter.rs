//! The Bluetooth adapter seam.
//!
//! The scan session never talks to a platform stack directly. It drives an
//! injected [`BluetoothAdapter`] for commands and receives the adapter's
//! callbacks as [`AdapterEvent`] values, usually over an mpsc channel fed by
//! the platform backend.

use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::peripheral::DiscoveryEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterState {
    Unknown,
    Resetting,
    Unsupported,
    Unauthorized,
    PoweredOff,
    PoweredOn,
}

impl AdapterState {
    pub fn is_ready(self) -> bool {
        self == AdapterState::PoweredOn
    }

    pub fn status_message(self) -> &'static str {
        match self {
            AdapterState::PoweredOn => "Bluetooth is Ready",
            AdapterState::PoweredOff => "Bluetooth is turned off",
            AdapterState::Resetting => "Bluetooth is resetting",
            AdapterState::Unauthorized => "Bluetooth is not authorized",
            AdapterState::Unsupported => "Bluetooth is not supported",
            AdapterState::Unknown => "Bluetooth state is unknown",
        }
    }
}

/// Callbacks delivered by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    Discovered(DiscoveryEvent),
    StateChanged(AdapterState),
}

pub trait BluetoothAdapter {
    fn adapter_state(&self) -> impl Future<Output = anyhow::Result<AdapterState>> + Send;

    fn start_scan(&self) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn stop_scan(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_powered_on_is_ready() {
        let states = [
            AdapterState::Unknown,
            AdapterState::Resetting,
            AdapterState::Unsupported,
            AdapterState::Unauthorized,
            AdapterState::PoweredOff,
        ];
        for state in states {
            assert!(!state.is_ready(), "{:?}", state);
        }
        assert!(AdapterState::PoweredOn.is_ready());
    }

    #[test]
    fn every_state_has_a_distinct_message() {
        let mut messages: Vec<_> = [
            AdapterState::Unknown,
            AdapterState::Resetting,
            AdapterState::Unsupported,
            AdapterState::Unauthorized,
            AdapterState::PoweredOff,
            AdapterState::PoweredOn,
        ]
        .iter()
        .map(|s| s.status_message())
        .collect();
        messages.sort();
        messages.dedup();
        assert_eq!(messages.len(), 6);
    }
}
