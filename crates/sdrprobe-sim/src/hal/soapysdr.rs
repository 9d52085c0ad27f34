//! # SoapySDR Driver
//!
//! Vendor-neutral receiver access through the SoapySDR abstraction layer.
//! The primary target is the CaribouLite board (`driver=Cariboulite`), whose
//! two front ends are selected with the `channel` device argument (`S1G` or
//! `HiF`).
//!
//! ## Requirements
//!
//! Install libSoapySDR and the device module:
//! - **Linux**: `sudo apt install libsoapysdr0.8 soapysdr-tools`
//! - **macOS**: `brew install soapysdr`
//!
//! Without the library (or with the `soapysdr` feature disabled) the driver
//! still registers, but discovery and open fail with
//! [`SdrError::LibraryNotFound`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sdrprobe_sim::hal::{create_default_registry, DeviceUri};
//!
//! let registry = create_default_registry();
//! let uri = DeviceUri::parse("soapysdr://driver=Cariboulite")?.with_default("channel", "HiF");
//! if registry.discover(&uri)?.is_empty() {
//!     return Err("no device".into());
//! }
//! let device = registry.open(&uri)?;
//! ```

use super::{DeviceDriver, SdrResult};
use crate::device::{DeviceInfo, SdrError};
use std::collections::HashMap;

#[cfg(feature = "soapysdr")]
use super::soapysdr_ffi::{self, SoapyDevice, SoapySdrError, SoapyStream, SOAPY_SDR_STREAM_ERROR, SOAPY_SDR_TIMEOUT};
#[cfg(feature = "soapysdr")]
use super::{apply_tuning, SdrDeviceExt, StreamConfig, StreamHandle, TunerControl};
#[cfg(feature = "soapysdr")]
use crate::device::SdrConfig;
#[cfg(feature = "soapysdr")]
use sdrprobe_core::types::{complex_ops::from_cf32, IQSample};
#[cfg(feature = "soapysdr")]
use std::sync::Arc;
#[cfg(feature = "soapysdr")]
use std::time::Duration;

/// Device arguments that select a front end rather than a device.
const OPEN_ONLY_ARGS: &[&str] = &["channel"];

/// SoapySDR device driver.
pub struct SoapySdrDriver {
    available: bool,
}

impl SoapySdrDriver {
    /// Create a new SoapySDR driver, checking whether the library loads.
    pub fn new() -> Self {
        #[cfg(feature = "soapysdr")]
        let available = soapysdr_ffi::is_available();
        #[cfg(not(feature = "soapysdr"))]
        let available = false;

        if available {
            tracing::debug!("SoapySDR driver initialized with hardware support");
        } else {
            tracing::debug!("SoapySDR driver initialized without libSoapySDR");
        }
        Self { available }
    }

    fn missing_library() -> SdrError {
        if cfg!(feature = "soapysdr") {
            SdrError::LibraryNotFound("libSoapySDR could not be loaded".to_string())
        } else {
            SdrError::LibraryNotFound("SoapySDR support not compiled in".to_string())
        }
    }
}

impl Default for SoapySdrDriver {
    fn default() -> Self {
        Self::new()
    }
}

/// Enumeration filter: everything except the open-only arguments.
fn discovery_filter(args: &HashMap<String, String>) -> HashMap<String, String> {
    args.iter()
        .filter(|(k, _)| !OPEN_ONLY_ARGS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

impl DeviceDriver for SoapySdrDriver {
    fn name(&self) -> &str {
        "soapysdr"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn discover(&self, args: &HashMap<String, String>) -> SdrResult<Vec<DeviceInfo>> {
        if !self.available {
            return Err(Self::missing_library());
        }

        #[cfg(feature = "soapysdr")]
        {
            let found = soapysdr_ffi::enumerate_devices(&discovery_filter(args))
                .map_err(|e| SdrError::DeviceNotFound(e.to_string()))?;

            let devices: Vec<DeviceInfo> = found
                .into_iter()
                .map(|d| DeviceInfo {
                    address: format!("soapysdr://{}", super::format_device_args(&d.args)),
                    driver: d.driver,
                    serial: d.serial,
                    label: d.label,
                })
                .collect();

            tracing::debug!("SoapySDR found {} devices", devices.len());
            for dev in &devices {
                tracing::debug!("  - {} ({})", dev.label, dev.driver);
            }
            Ok(devices)
        }

        #[cfg(not(feature = "soapysdr"))]
        {
            let _ = discovery_filter(args);
            Err(Self::missing_library())
        }
    }

    fn open(&self, args: &HashMap<String, String>) -> SdrResult<Box<dyn super::SdrDeviceExt>> {
        if !self.available {
            return Err(Self::missing_library());
        }

        #[cfg(feature = "soapysdr")]
        {
            let device = SoapyDevice::make(args).map_err(|e| SdrError::OpenFailed(e.to_string()))?;
            Ok(Box::new(SoapySdrDevice::new(Arc::new(device))))
        }

        #[cfg(not(feature = "soapysdr"))]
        {
            let _ = args;
            Err(Self::missing_library())
        }
    }
}

/// Opened SoapySDR device.
#[cfg(feature = "soapysdr")]
pub struct SoapySdrDevice {
    info: DeviceInfo,
    config: SdrConfig,
    device: Arc<SoapyDevice>,
}

#[cfg(feature = "soapysdr")]
impl SoapySdrDevice {
    fn new(device: Arc<SoapyDevice>) -> Self {
        let ffi_info = device.info();
        let info = DeviceInfo {
            driver: ffi_info.driver.clone(),
            serial: ffi_info.serial.clone(),
            label: device.hardware_key(),
            address: format!("soapysdr://{}", super::format_device_args(&ffi_info.args)),
        };
        Self {
            info,
            config: SdrConfig::default(),
            device,
        }
    }
}

#[cfg(feature = "soapysdr")]
impl SdrDeviceExt for SoapySdrDevice {
    fn name(&self) -> &str {
        &self.info.label
    }

    fn info(&self) -> &DeviceInfo {
        &self.info
    }

    fn config(&self) -> &SdrConfig {
        &self.config
    }

    fn configure(&mut self, config: &SdrConfig) -> SdrResult<()> {
        if config.channel.index() >= self.device.num_rx_channels() {
            return Err(SdrError::ConfigError(format!(
                "channel {} not available ({} RX channels)",
                config.channel,
                self.device.num_rx_channels()
            )));
        }
        self.config = apply_tuning(self, config)?;
        Ok(())
    }

    fn create_rx_stream(&mut self, config: StreamConfig) -> SdrResult<Box<dyn StreamHandle>> {
        let stream = self
            .device
            .setup_rx_stream(config.channel)
            .map_err(|e| SdrError::StreamSetup(e.to_string()))?;
        Ok(Box::new(SoapySdrStream::new(stream, config.buffer_size)))
    }
}

#[cfg(feature = "soapysdr")]
fn config_error(e: SoapySdrError) -> SdrError {
    SdrError::ConfigError(e.to_string())
}

#[cfg(feature = "soapysdr")]
impl TunerControl for SoapySdrDevice {
    fn set_sample_rate(&mut self, channel: usize, rate: f64) -> SdrResult<f64> {
        self.device.set_sample_rate(channel, rate).map_err(config_error)?;
        Ok(self.device.get_sample_rate(channel))
    }

    fn set_frequency(&mut self, channel: usize, freq_hz: f64) -> SdrResult<f64> {
        self.device.set_frequency(channel, freq_hz).map_err(config_error)?;
        Ok(self.device.get_frequency(channel))
    }

    fn set_rx_gain(&mut self, channel: usize, gain_db: f64) -> SdrResult<f64> {
        self.device.set_gain(channel, gain_db).map_err(config_error)?;
        Ok(self.device.get_gain(channel))
    }
}

/// RX stream over a SoapySDR CF32 stream.
#[cfg(feature = "soapysdr")]
struct SoapySdrStream {
    stream: SoapyStream,
    running: bool,
    closed: bool,
    scratch: Vec<[f32; 2]>,
}

#[cfg(feature = "soapysdr")]
impl SoapySdrStream {
    fn new(stream: SoapyStream, buffer_size: usize) -> Self {
        Self {
            stream,
            running: false,
            closed: false,
            scratch: vec![[0.0, 0.0]; buffer_size.max(1)],
        }
    }
}

#[cfg(feature = "soapysdr")]
fn stream_error(e: SoapySdrError) -> SdrError {
    match e {
        SoapySdrError::Read { code, .. } if code == SOAPY_SDR_TIMEOUT => SdrError::Timeout,
        SoapySdrError::Read { code, message } => SdrError::Stream { code, message },
        other => SdrError::Stream {
            code: SOAPY_SDR_STREAM_ERROR,
            message: other.to_string(),
        },
    }
}

#[cfg(feature = "soapysdr")]
impl StreamHandle for SoapySdrStream {
    fn start(&mut self) -> SdrResult<()> {
        if self.running {
            return Ok(());
        }
        if self.closed {
            return Err(SdrError::StreamSetup("stream already closed".to_string()));
        }
        self.stream
            .activate()
            .map_err(|e| SdrError::StreamSetup(e.to_string()))?;
        self.running = true;
        tracing::debug!(mtu = self.stream.mtu(), "SoapySDR stream activated");
        Ok(())
    }

    fn stop(&mut self) -> SdrResult<()> {
        if !self.running {
            return Ok(());
        }
        self.running = false;
        self.stream.deactivate().map_err(stream_error)
    }

    fn read(&mut self, buffer: &mut [IQSample], timeout: Duration) -> SdrResult<usize> {
        if !self.running {
            return Err(SdrError::NotStarted);
        }

        let timeout_us = timeout.as_micros().min(i64::MAX as u128) as i64;
        let want = buffer.len().min(self.scratch.len());

        let n = self
            .stream
            .read(&mut self.scratch[..want], timeout_us)
            .map_err(stream_error)?;

        for (dst, &pair) in buffer.iter_mut().zip(&self.scratch[..n]) {
            *dst = from_cf32(pair);
        }
        Ok(n)
    }

    fn close(&mut self) -> SdrResult<()> {
        if self.closed {
            return Ok(());
        }
        self.running = false;
        self.closed = true;
        self.stream.close().map_err(stream_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_name() {
        let driver = SoapySdrDriver::new();
        assert_eq!(driver.name(), "soapysdr");
    }

    #[test]
    fn test_discovery_filter_drops_channel() {
        let args = super::super::parse_device_args("driver=Cariboulite,channel=HiF");
        let filter = discovery_filter(&args);
        assert_eq!(filter.len(), 1);
        assert_eq!(filter["driver"], "Cariboulite");
    }

    #[test]
    fn test_missing_library_is_reported() {
        let driver = SoapySdrDriver::new();
        if driver.is_available() {
            println!("Skipping test - libSoapySDR is installed");
            return;
        }
        let args = super::super::parse_device_args("driver=Cariboulite");
        assert!(matches!(
            driver.discover(&args),
            Err(SdrError::LibraryNotFound(_))
        ));
        assert!(matches!(driver.open(&args), Err(SdrError::LibraryNotFound(_))));
    }

    #[test]
    fn test_driver_discover() {
        let driver = SoapySdrDriver::new();
        if !driver.is_available() {
            println!("Skipping test - libSoapySDR not available");
            return;
        }
        let devices = driver.discover(&HashMap::new()).unwrap();
        // Number depends on hardware connected
        println!("Found {} SoapySDR devices", devices.len());
        for dev in &devices {
            println!("  - {} (serial: {})", dev.label, dev.serial);
        }
    }
}
