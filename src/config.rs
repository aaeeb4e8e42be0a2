use serde::{Deserialize, Serialize};

use crate::protocol::Framing;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub device: DeviceConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    /// Byte-stuffing mode; must match the device firmware
    pub framing: Framing,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfig {
    /// Human-readable device name, used in logs
    pub name: String,
    /// Bluetooth address, e.g. "11:75:58:AA:BB:CC"
    pub address: String,
    /// Serial port the SPP link is bound to, e.g. "/dev/rfcomm0"
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Whether the device is paired; secure connects are only tried when set
    #[serde(default)]
    pub bonded: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransportConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            chunk_size: default_chunk_size(),
            chunk_delay_ms: default_chunk_delay_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_baud_rate() -> u32 {
    115200
}

fn default_chunk_size() -> usize {
    200
}

fn default_chunk_delay_ms() -> u64 {
    20
}

fn default_timeout_ms() -> u64 {
    1000
}
