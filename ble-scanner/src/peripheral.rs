//! Discovered peripherals and the views derived from their advertisements.

use btleplug::api::bleuuid::BleUuid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Name used when a peripheral does not report one.
pub const UNKNOWN_DEVICE_NAME: &str = "Unknown Device";

/// Well-known advertisement keys.
pub mod keys {
    pub const LOCAL_NAME: &str = "local_name";
    pub const MANUFACTURER_DATA: &str = "manufacturer_data";
    pub const SERVICE_UUIDS: &str = "service_uuids";
    pub const TX_POWER_LEVEL: &str = "tx_power_level";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AdvertisementValue {
    Text(String),
    Bytes(Vec<u8>),
    Services(Vec<Uuid>),
    Integer(i64),
}

pub type AdvertisementData = BTreeMap<String, AdvertisementValue>;

/// A single observation of a peripheral's advertisement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryEvent {
    pub id: String,
    pub name: Option<String>,
    pub rssi: i16,
    pub advertisement_data: AdvertisementData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPeripheral {
    pub id: String,
    pub name: String,
    pub rssi: i16,
    pub advertisement_data: AdvertisementData,
}

impl From<DiscoveryEvent> for DiscoveredPeripheral {
    fn from(event: DiscoveryEvent) -> Self {
        Self {
            id: event.id,
            name: event.name.unwrap_or_else(|| UNKNOWN_DEVICE_NAME.to_string()),
            rssi: event.rssi,
            advertisement_data: event.advertisement_data,
        }
    }
}

impl DiscoveredPeripheral {
    pub fn strength(&self) -> SignalStrength {
        SignalStrength::from_rssi(self.rssi)
    }

    /// Advertised service UUIDs, empty when none were advertised.
    pub fn services(&self) -> &[Uuid] {
        match self.advertisement_data.get(keys::SERVICE_UUIDS) {
            Some(AdvertisementValue::Services(services)) => services,
            _ => &[],
        }
    }

    pub fn services_label(&self) -> String {
        let services = self.services();
        if services.is_empty() {
            return "No Services advertised".to_string();
        }

        services
            .iter()
            .map(short_uuid_label)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn local_name(&self) -> Option<&str> {
        match self.advertisement_data.get(keys::LOCAL_NAME) {
            Some(AdvertisementValue::Text(name)) => Some(name),
            _ => None,
        }
    }

    pub fn manufacturer_data(&self) -> Option<&[u8]> {
        match self.advertisement_data.get(keys::MANUFACTURER_DATA) {
            Some(AdvertisementValue::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Manufacturer bytes as space separated uppercase hex, e.g. `01 02 0A`.
    pub fn manufacturer_hex(&self) -> Option<String> {
        self.manufacturer_data().map(|bytes| {
            bytes
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    pub fn tx_power_level(&self) -> Option<i64> {
        match self.advertisement_data.get(keys::TX_POWER_LEVEL) {
            Some(AdvertisementValue::Integer(level)) => Some(*level),
            _ => None,
        }
    }
}

/// Bluetooth SIG assigned UUIDs print in their short form (`180D`),
/// anything else as the full uppercase UUID.
fn short_uuid_label(uuid: &Uuid) -> String {
    match uuid.to_ble_u16() {
        Some(short) => format!("{:04X}", short),
        None => uuid.hyphenated().to_string().to_uppercase(),
    }
}

/// Coarse signal quality bucket for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStrength {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SignalStrength {
    pub fn from_rssi(rssi: i16) -> Self {
        if rssi >= -50 {
            SignalStrength::Excellent
        } else if rssi >= -70 {
            SignalStrength::Good
        } else if rssi >= -80 {
            SignalStrength::Fair
        } else {
            SignalStrength::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalStrength::Excellent => "Excellent",
            SignalStrength::Good => "Good",
            SignalStrength::Fair => "Fair",
            SignalStrength::Poor => "Poor",
        }
    }

    /// Indicator colour shown next to the label.
    pub fn color(self) -> &'static str {
        match self {
            SignalStrength::Excellent => "green",
            SignalStrength::Good => "yellow",
            SignalStrength::Fair => "red",
            SignalStrength::Poor => "gray",
        }
    }
}
