//! # Hardware Abstraction Layer (HAL)
//!
//! This module provides a layered abstraction for SDR receivers:
//!
//! - **StreamHandle**: Streaming I/Q samples with per-read timeouts
//! - **TunerControl**: Frequency, sample rate and gain on one channel
//! - **SdrDeviceExt**: High-level device interface combining both
//! - **DeviceDriver**: Discovery and construction, selected by URI scheme
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Capture controller / CLI                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                  HAL Interface (Rust traits)                │
//! │      SdrDeviceExt, StreamHandle, TunerControl               │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │   Simulator (simulator://)   │  SoapySDR (soapysdr://)      │
//! │                              │  libSoapySDR via libloading  │
//! └──────────────────────────────┴──────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sdrprobe_sim::hal::{create_default_registry, DeviceUri, StreamConfig};
//!
//! let registry = create_default_registry();
//! let uri = DeviceUri::parse("simulator://tone_hz=100000")?;
//! let mut device = registry.open(&uri)?;
//! device.configure(&config)?;
//!
//! let mut stream = device.create_rx_stream(StreamConfig::default())?;
//! stream.start()?;
//! let n = stream.read(&mut buffer, Duration::from_secs(1))?;
//! stream.close()?;
//! ```

use sdrprobe_core::types::IQSample;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

pub mod soapysdr;
#[cfg(feature = "soapysdr")]
pub mod soapysdr_ffi;

pub use crate::device::{Channel, DeviceInfo, SdrConfig, SdrError, SdrResult};
pub use soapysdr::SoapySdrDriver;

/// Stream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Channel index to receive on
    pub channel: usize,
    /// Largest read the caller will request, in samples
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel: 0,
            buffer_size: 4096,
        }
    }
}

impl StreamConfig {
    pub fn for_channel(channel: Channel) -> Self {
        Self {
            channel: channel.index(),
            ..Default::default()
        }
    }
}

/// Streaming interface for received I/Q samples.
pub trait StreamHandle: Send {
    /// Activate the stream.
    fn start(&mut self) -> SdrResult<()>;

    /// Deactivate the stream. Stopping a stopped stream is a no-op.
    fn stop(&mut self) -> SdrResult<()>;

    /// Read up to `buffer.len()` samples.
    ///
    /// Returns the number of samples written to the front of `buffer`.
    /// A read that waits longer than `timeout` fails with
    /// [`SdrError::Timeout`]; other driver status codes come back as
    /// [`SdrError::Stream`].
    fn read(&mut self, buffer: &mut [IQSample], timeout: Duration) -> SdrResult<usize>;

    /// Release the stream. Further reads fail.
    fn close(&mut self) -> SdrResult<()>;
}

/// Tuner control interface for frequency, gain, and sample rate.
///
/// Each setter returns the value the hardware actually applied.
pub trait TunerControl: Send {
    fn set_sample_rate(&mut self, channel: usize, rate: f64) -> SdrResult<f64>;

    fn set_frequency(&mut self, channel: usize, freq_hz: f64) -> SdrResult<f64>;

    fn set_rx_gain(&mut self, channel: usize, gain_db: f64) -> SdrResult<f64>;
}

/// Apply `config` through a tuner: sample rate, then frequency, then gain.
///
/// Returns the configuration the hardware actually settled on.
pub fn apply_tuning(tuner: &mut dyn TunerControl, config: &SdrConfig) -> SdrResult<SdrConfig> {
    let channel = config.channel.index();

    let applied = SdrConfig {
        sample_rate: tuner.set_sample_rate(channel, config.sample_rate)?,
        frequency: tuner.set_frequency(channel, config.frequency)?,
        rx_gain: tuner.set_rx_gain(channel, config.rx_gain)?,
        channel: config.channel,
    };

    if applied != *config {
        tracing::warn!(
            sample_rate = applied.sample_rate,
            frequency = applied.frequency,
            gain = applied.rx_gain,
            "Receiver adjusted the requested tuning"
        );
    }
    tracing::debug!(
        channel,
        sample_rate = applied.sample_rate,
        frequency = applied.frequency,
        gain = applied.rx_gain,
        "Receiver tuned"
    );
    Ok(applied)
}

/// High-level SDR device interface.
pub trait SdrDeviceExt: Send {
    /// Get device name/description.
    fn name(&self) -> &str;

    /// Discovery record of the opened device.
    fn info(&self) -> &DeviceInfo;

    /// Get current configuration.
    fn config(&self) -> &SdrConfig;

    /// Apply configuration. [`SdrDeviceExt::config`] then reports the
    /// values the hardware accepted.
    fn configure(&mut self, config: &SdrConfig) -> SdrResult<()>;

    /// Create an RX stream.
    fn create_rx_stream(&mut self, config: StreamConfig) -> SdrResult<Box<dyn StreamHandle>>;
}

/// Driver factory for creating devices.
pub trait DeviceDriver: Send + Sync {
    /// Driver name, also the URI scheme (e.g., "soapysdr", "simulator").
    fn name(&self) -> &str;

    /// Whether the driver's runtime dependencies are present.
    fn is_available(&self) -> bool {
        true
    }

    /// Discover devices matching `args`.
    fn discover(&self, args: &HashMap<String, String>) -> SdrResult<Vec<DeviceInfo>>;

    /// Open a device described by `args`.
    fn open(&self, args: &HashMap<String, String>) -> SdrResult<Box<dyn SdrDeviceExt>>;
}

/// Parsed `driver://key=value,key=value` device string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUri {
    pub driver: String,
    pub args: HashMap<String, String>,
}

impl DeviceUri {
    pub fn parse(uri: &str) -> SdrResult<Self> {
        let (driver, args) = uri.split_once("://").ok_or_else(|| {
            SdrError::ConfigError(format!(
                "Invalid device URI '{}'. Use 'driver://args'",
                uri
            ))
        })?;
        if driver.is_empty() {
            return Err(SdrError::ConfigError(format!(
                "Missing driver in device URI '{}'",
                uri
            )));
        }
        Ok(Self {
            driver: driver.to_string(),
            args: parse_device_args(args),
        })
    }

    /// Set `key` unless the URI already carries it.
    pub fn with_default(mut self, key: &str, value: &str) -> Self {
        self.args
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
        self
    }
}

impl fmt::Display for DeviceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.driver, format_device_args(&self.args))
    }
}

/// Parse `key1=value1,key2=value2,...`. Pairs without `=` are ignored.
pub fn parse_device_args(args: &str) -> HashMap<String, String> {
    args.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

/// Format args as `key=value,...` in key order.
pub fn format_device_args(args: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = args.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Registry of available device drivers.
pub struct DriverRegistry {
    drivers: Vec<Box<dyn DeviceDriver>>,
}

impl DriverRegistry {
    /// Create a new registry.
    pub fn new() -> Self {
        Self {
            drivers: Vec::new(),
        }
    }

    /// Register a device driver.
    pub fn register(&mut self, driver: Box<dyn DeviceDriver>) {
        self.drivers.push(driver);
    }

    /// Get a driver by name.
    pub fn get(&self, name: &str) -> Option<&dyn DeviceDriver> {
        self.drivers
            .iter()
            .find(|d| d.name() == name)
            .map(|d| d.as_ref())
    }

    /// List all registered drivers.
    pub fn list(&self) -> Vec<&str> {
        self.drivers.iter().map(|d| d.name()).collect()
    }

    fn driver_for(&self, uri: &DeviceUri) -> SdrResult<&dyn DeviceDriver> {
        self.get(&uri.driver).ok_or_else(|| {
            SdrError::DeviceNotFound(format!(
                "Unknown driver '{}' (available: {})",
                uri.driver,
                self.list().join(", ")
            ))
        })
    }

    /// Enumerate devices matching a URI.
    pub fn discover(&self, uri: &DeviceUri) -> SdrResult<Vec<DeviceInfo>> {
        self.driver_for(uri)?.discover(&uri.args)
    }

    /// Open a device from a URI.
    pub fn open(&self, uri: &DeviceUri) -> SdrResult<Box<dyn SdrDeviceExt>> {
        self.driver_for(uri)?.open(&uri.args)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a driver registry with all built-in drivers.
///
/// - SoapySDR driver (CaribouLite and any other SoapySDR-supported receiver)
/// - Simulator driver (software tone-plus-noise source with fault injection)
pub fn create_default_registry() -> DriverRegistry {
    let mut registry = DriverRegistry::new();
    registry.register(Box::new(soapysdr::SoapySdrDriver::new()));
    registry.register(Box::new(crate::simulator::SimulatorDriver::new()));
    registry
}
