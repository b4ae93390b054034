//! Modbus routine configuration.

use std::time::Duration;

use serde::Deserialize;

/// Port used when a data provider does not name one.
pub const DEFAULT_PORT: u16 = 502;

/// Configuration for the Modbus/TCP acquisition routine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModbusConfig {
    /// Slave (unit) identifier addressed by every request.
    pub unit_id: u8,
    /// Address of the holding register to read.
    pub register: u16,
    /// Upper bound for connect, request and response, in milliseconds.
    pub timeout_ms: u64,
}

impl ModbusConfig {
    /// The request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            unit_id: 1,
            register: 0,
            timeout_ms: 3000,
        }
    }
}
