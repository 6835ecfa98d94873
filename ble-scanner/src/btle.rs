//! btleplug backed [`BluetoothAdapter`].

use btleplug::api::{
    Central, CentralEvent, CentralState, Manager as _, Peripheral as _, PeripheralProperties,
    ScanFilter,
};
use btleplug::platform::{Adapter, Manager, PeripheralId};
use byteorder::{LittleEndian, WriteBytesExt};
use futures::stream::StreamExt;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::adapter::{AdapterEvent, AdapterState, BluetoothAdapter};
use crate::peripheral::{keys, AdvertisementData, AdvertisementValue, DiscoveryEvent};

impl From<CentralState> for AdapterState {
    fn from(state: CentralState) -> Self {
        match state {
            CentralState::PoweredOn => AdapterState::PoweredOn,
            CentralState::PoweredOff => AdapterState::PoweredOff,
            _ => AdapterState::Unknown,
        }
    }
}

#[derive(Clone)]
pub struct BtleAdapter {
    adapter: Adapter,
}

impl BtleAdapter {
    /// Pick the adapter at `index` in the host's adapter list.
    pub async fn select(manager: &Manager, index: usize) -> anyhow::Result<Self> {
        let adapters = manager.adapters().await?;

        if adapters.is_empty() {
            anyhow::bail!("No Bluetooth adapters found");
        }

        let count = adapters.len();
        let adapter = adapters.into_iter().nth(index).ok_or_else(|| {
            anyhow::anyhow!("No Bluetooth adapter at index {} ({} found)", index, count)
        })?;

        info!("Using Bluetooth adapter: {}", adapter.adapter_info().await?);

        Ok(Self { adapter })
    }

    /// Forward the adapter's central events to `tx` until either side closes.
    pub async fn pump_events(&self, tx: mpsc::Sender<AdapterEvent>) -> anyhow::Result<()> {
        let mut events = self.adapter.events().await?;
        debug!("Listening for adapter events");

        while let Some(event) = events.next().await {
            let event = match event {
                CentralEvent::DeviceDiscovered(id)
                | CentralEvent::DeviceUpdated(id)
                | CentralEvent::ManufacturerDataAdvertisement { id, .. }
                | CentralEvent::ServiceDataAdvertisement { id, .. }
                | CentralEvent::ServicesAdvertisement { id, .. } => {
                    match self.discovery(&id).await {
                        Ok(Some(discovery)) => AdapterEvent::Discovered(discovery),
                        Ok(None) => continue,
                        Err(e) => {
                            trace!("Failed to read properties of {}: {}", id, e);
                            continue;
                        }
                    }
                }
                CentralEvent::StateUpdate(state) => AdapterEvent::StateChanged(state.into()),
                _ => continue,
            };

            if tx.send(event).await.is_err() {
                break;
            }
        }

        debug!("Adapter event stream ended");
        Ok(())
    }

    async fn discovery(&self, id: &PeripheralId) -> anyhow::Result<Option<DiscoveryEvent>> {
        let peripheral = self.adapter.peripheral(id).await?;

        let Some(properties) = peripheral.properties().await? else {
            return Ok(None);
        };
        // nothing to rank without a signal reading
        let Some(rssi) = properties.rssi else {
            trace!("Skipping {} without RSSI", id);
            return Ok(None);
        };

        Ok(Some(DiscoveryEvent {
            id: id.to_string(),
            name: properties.local_name.clone(),
            rssi,
            advertisement_data: advertisement_data(&properties)?,
        }))
    }
}

impl BluetoothAdapter for BtleAdapter {
    async fn adapter_state(&self) -> anyhow::Result<AdapterState> {
        Ok(self.adapter.adapter_state().await?.into())
    }

    async fn start_scan(&self) -> anyhow::Result<()> {
        self.adapter.start_scan(ScanFilter::default()).await?;
        Ok(())
    }

    async fn stop_scan(&self) -> anyhow::Result<()> {
        self.adapter.stop_scan().await?;
        Ok(())
    }
}

fn advertisement_data(properties: &PeripheralProperties) -> std::io::Result<AdvertisementData> {
    let mut data = AdvertisementData::new();

    if let Some(name) = &properties.local_name {
        data.insert(
            keys::LOCAL_NAME.to_string(),
            AdvertisementValue::Text(name.clone()),
        );
    }
    if !properties.manufacturer_data.is_empty() {
        data.insert(
            keys::MANUFACTURER_DATA.to_string(),
            AdvertisementValue::Bytes(encode_manufacturer_data(&properties.manufacturer_data)?),
        );
    }
    if !properties.services.is_empty() {
        data.insert(
            keys::SERVICE_UUIDS.to_string(),
            AdvertisementValue::Services(properties.services.clone()),
        );
    }
    if let Some(level) = properties.tx_power_level {
        data.insert(
            keys::TX_POWER_LEVEL.to_string(),
            AdvertisementValue::Integer(level.into()),
        );
    }
    for (uuid, payload) in &properties.service_data {
        data.insert(
            format!("service_data.{}", uuid),
            AdvertisementValue::Bytes(payload.clone()),
        );
    }

    Ok(data)
}

/// Lay manufacturer entries out the way they appear on air: company id
/// (little endian) followed by the payload, lowest company id first.
fn encode_manufacturer_data(entries: &HashMap<u16, Vec<u8>>) -> std::io::Result<Vec<u8>> {
    let mut companies: Vec<_> = entries.keys().copied().collect();
    companies.sort_unstable();

    let mut out = Vec::new();
    for company in companies {
        out.write_u16::<LittleEndian>(company)?;
        out.extend_from_slice(&entries[&company]);
    }
    Ok(out)
}
