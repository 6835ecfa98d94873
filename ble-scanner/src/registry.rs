use crate::peripheral::{DiscoveredPeripheral, DiscoveryEvent};

/// Peripherals seen during the current scan, strongest signal first.
///
/// Holds at most one entry per id. A repeat discovery replaces the earlier
/// entry wholesale, so advertisement fields absent from the newer event are
/// dropped. Entries with equal RSSI keep their insertion order.
#[derive(Debug, Default, Clone)]
pub struct DiscoveryRegistry {
    peripherals: Vec<DiscoveredPeripheral>,
}

impl DiscoveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.peripherals.clear();
    }

    /// Record a discovery, returning true if the id was already known.
    pub fn ingest(&mut self, event: DiscoveryEvent) -> bool {
        let peripheral = DiscoveredPeripheral::from(event);

        let replaced = match self.peripherals.iter().position(|p| p.id == peripheral.id) {
            Some(index) => {
                self.peripherals.remove(index);
                true
            }
            None => false,
        };

        self.peripherals.push(peripheral);
        // stable sort: ties stay in insertion order
        self.peripherals.sort_by(|a, b| b.rssi.cmp(&a.rssi));

        replaced
    }

    pub fn snapshot(&self) -> Vec<DiscoveredPeripheral> {
        self.peripherals.clone()
    }

    /// Case-insensitive name filter over the ranked list.
    pub fn search(&self, query: &str) -> Vec<DiscoveredPeripheral> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.snapshot();
        }

        self.peripherals
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&DiscoveredPeripheral> {
        self.peripherals.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.peripherals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peripherals.is_empty()
    }
}
