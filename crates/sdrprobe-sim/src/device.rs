//! SDR Device Configuration and Errors
//!
//! Types shared by every driver: the receiver configuration, the channel
//! selection, discovery records and the error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Receive channel of a dual-band front end.
///
/// The CaribouLite board exposes a sub-GHz path (`S1G`, index 0) and a
/// wideband path (`HiF`, index 1). Other devices just use the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Channel {
    S1G,
    #[default]
    HiF,
}

impl Channel {
    /// Stream channel index.
    pub fn index(self) -> usize {
        match self {
            Channel::S1G => 0,
            Channel::HiF => 1,
        }
    }

    /// Name passed to the driver as the `channel` device argument.
    pub fn label(self) -> &'static str {
        match self {
            Channel::S1G => "S1G",
            Channel::HiF => "HiF",
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Channel::S1G),
            1 => Some(Channel::HiF),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ch {})", self.label(), self.index())
    }
}

/// SDR configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SdrConfig {
    /// Center frequency in Hz
    pub frequency: f64,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Receive gain in dB
    pub rx_gain: f64,
    /// Receive channel
    pub channel: Channel,
}

impl Default for SdrConfig {
    fn default() -> Self {
        Self {
            frequency: 100.0e6,
            sample_rate: 2.0e6,
            rx_gain: 50.0,
            channel: Channel::HiF,
        }
    }
}

impl SdrConfig {
    /// Build from the command-line units (MHz, MHz, dB).
    pub fn from_mhz(freq_mhz: f64, bandwidth_mhz: f64, gain_db: f64, channel: Channel) -> Self {
        Self {
            frequency: freq_mhz * 1e6,
            sample_rate: bandwidth_mhz * 1e6,
            rx_gain: gain_db,
            channel,
        }
    }
}

/// Result type for SDR operations
pub type SdrResult<T> = Result<T, SdrError>;

/// Errors that can occur during SDR operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SdrError {
    #[error("Driver library not available: {0}")]
    LibraryNotFound(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Stream setup failed: {0}")]
    StreamSetup(String),

    #[error("Timeout waiting for samples")]
    Timeout,

    #[error("Stream error {code}: {message}")]
    Stream { code: i32, message: String },

    #[error("Device not started")]
    NotStarted,
}

impl SdrError {
    /// Driver status code for stream failures (`-1` for timeouts).
    pub fn status_code(&self) -> Option<i32> {
        match self {
            SdrError::Timeout => Some(-1),
            SdrError::Stream { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Device information for discovery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    /// Device type/driver
    pub driver: String,
    /// Device serial number
    pub serial: String,
    /// Device label/name
    pub label: String,
    /// Connection string
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_mapping() {
        assert_eq!(Channel::from_index(0), Some(Channel::S1G));
        assert_eq!(Channel::from_index(1), Some(Channel::HiF));
        assert_eq!(Channel::from_index(2), None);
        assert_eq!(Channel::S1G.label(), "S1G");
        assert_eq!(Channel::HiF.index(), 1);
        assert_eq!(Channel::HiF.to_string(), "HiF (ch 1)");
    }

    #[test]
    fn test_config_from_mhz() {
        let config = SdrConfig::from_mhz(433.92, 2.0, 40.0, Channel::S1G);
        assert_eq!(config.frequency, 433.92e6);
        assert_eq!(config.sample_rate, 2.0e6);
        assert_eq!(config.rx_gain, 40.0);
        assert_eq!(config.channel, Channel::S1G);
    }

    #[test]
    fn test_default_matches_cli_defaults() {
        let config = SdrConfig::default();
        assert_eq!(config, SdrConfig::from_mhz(100.0, 2.0, 50.0, Channel::HiF));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(SdrError::Timeout.status_code(), Some(-1));
        let err = SdrError::Stream {
            code: -4,
            message: "OVERFLOW".into(),
        };
        assert_eq!(err.status_code(), Some(-4));
        assert_eq!(SdrError::NotStarted.status_code(), None);
    }
}
