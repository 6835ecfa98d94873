use anyhow::Context;
use std::{net::SocketAddr, str::FromStr, time::Duration};

pub const ADDR_VAR: &str = "BLE_SCANNER_ADDR";
pub const ADAPTER_VAR: &str = "BLE_SCANNER_ADAPTER";
pub const SCAN_SECS_VAR: &str = "BLE_SCANNER_SCAN_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub addr: SocketAddr,
    /// Index into the host's Bluetooth adapter list.
    pub adapter_index: usize,
    /// How long the terminal scanner listens before printing results.
    pub scan_duration: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            adapter_index: 0,
            scan_duration: Duration::from_secs(10),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source, falling back to
    /// defaults for anything unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            addr: parse_var(&lookup, ADDR_VAR)?.unwrap_or(defaults.addr),
            adapter_index: parse_var(&lookup, ADAPTER_VAR)?.unwrap_or(defaults.adapter_index),
            scan_duration: parse_var::<u64, _>(&lookup, SCAN_SECS_VAR)?
                .map(Duration::from_secs)
                .unwrap_or(defaults.scan_duration),
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("invalid value for {}: {:?}", key, raw)),
        _ => Ok(None),
    }
}
