//! Scan for nearby BLE peripherals and rank them by signal strength.
//!
//! [`registry::DiscoveryRegistry`] deduplicates discovery events and keeps
//! them ordered strongest first. [`session::ScanSession`] wraps it in the
//! Idle/Scanning state machine and drives an injected
//! [`adapter::BluetoothAdapter`]; [`btle::BtleAdapter`] is the btleplug
//! implementation used by the binaries.

pub mod adapter;
pub mod btle;
pub mod config;
pub mod peripheral;
pub mod registry;
pub mod server;
pub mod session;
