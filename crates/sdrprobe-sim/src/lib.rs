//! # sdrprobe device layer
//!
//! Receiver access for the validation pipeline:
//!
//! - **device**: receiver configuration, channel selection and errors
//! - **hal**: driver traits, device URIs and the driver registry
//! - **simulator**: software receiver with fault injection
//! - **capture**: bounded-retry read loop filling a sample buffer
//!
//! ## Example
//!
//! ```rust
//! use sdrprobe_sim::capture::{capture, CaptureConfig};
//! use sdrprobe_sim::hal::{create_default_registry, DeviceUri, StreamConfig};
//! use sdrprobe_sim::SdrConfig;
//!
//! let registry = create_default_registry();
//! let uri = DeviceUri::parse("simulator://seed=1").unwrap();
//! let mut device = registry.open(&uri).unwrap();
//!
//! let config = SdrConfig::default();
//! device.configure(&config).unwrap();
//! let mut stream = device
//!     .create_rx_stream(StreamConfig::for_channel(config.channel))
//!     .unwrap();
//!
//! let capture = capture(stream.as_mut(), &CaptureConfig::new(8192)).unwrap();
//! assert!(capture.result.is_complete());
//! ```

pub mod capture;
pub mod device;
pub mod hal;
pub mod simulator;

pub use capture::{capture, Capture, CaptureConfig, CaptureResult, CaptureStatus};
pub use device::{Channel, DeviceInfo, SdrConfig, SdrError, SdrResult};
pub use simulator::{SimulatorConfig, SimulatorDriver};
