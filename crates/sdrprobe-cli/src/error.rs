//! Run failures and their process exit codes.

use sdrprobe_core::{DspError, IntegrityError};
use sdrprobe_sim::SdrError;

/// Everything that can stop a validation run.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Missing dependencies: {}", .0.join(", "))]
    DependencyMissing(Vec<String>),

    #[error("No SDR device found: {0}")]
    DeviceNotFound(String),

    #[error("Failed to open device: {0}")]
    DeviceOpenFailed(String),

    #[error("Failed to configure device: {0}")]
    ConfigurationFailed(String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Insufficient samples captured: {read}/{requested}{}", after(.cause))]
    InsufficientSamples {
        read: usize,
        requested: usize,
        cause: Option<String>,
    },

    #[error("Captured data is all zeros (hardware issue){}", after(.cause))]
    AllZeroSignal { cause: Option<String> },

    #[error("Spectral estimation failed: {0}")]
    EstimationPrecondition(#[from] DspError),

    #[error("Failed to write report: {0:#}")]
    ReportFailed(anyhow::Error),
}

impl ProbeError {
    /// Process exit code: 1 device, 2 capture, 3 dependencies.
    pub fn exit_code(&self) -> u8 {
        match self {
            ProbeError::DependencyMissing(_) => 3,
            ProbeError::DeviceNotFound(_)
            | ProbeError::DeviceOpenFailed(_)
            | ProbeError::ConfigurationFailed(_)
            | ProbeError::ReportFailed(_) => 1,
            ProbeError::StreamError(_)
            | ProbeError::InsufficientSamples { .. }
            | ProbeError::AllZeroSignal { .. }
            | ProbeError::EstimationPrecondition(_) => 2,
        }
    }

    /// Pipeline stage that failed.
    pub fn stage(&self) -> &'static str {
        match self {
            ProbeError::DependencyMissing(_) => "dependencies",
            ProbeError::DeviceNotFound(_) => "discovery",
            ProbeError::DeviceOpenFailed(_) => "open",
            ProbeError::ConfigurationFailed(_) => "configure",
            ProbeError::StreamError(_) => "capture",
            ProbeError::InsufficientSamples { .. } | ProbeError::AllZeroSignal { .. } => {
                "integrity"
            }
            ProbeError::EstimationPrecondition(_) => "analysis",
            ProbeError::ReportFailed(_) => "report",
        }
    }

    /// Attach the driver error that ended the capture to an integrity failure.
    pub fn with_stream_cause(mut self, error: Option<&SdrError>) -> Self {
        if let ProbeError::InsufficientSamples { cause, .. } | ProbeError::AllZeroSignal { cause } =
            &mut self
        {
            *cause = error.map(|e| e.to_string());
        }
        self
    }
}

fn after(cause: &Option<String>) -> String {
    match cause {
        Some(cause) => format!(" after stream error: {}", cause),
        None => String::new(),
    }
}

impl From<SdrError> for ProbeError {
    fn from(err: SdrError) -> Self {
        match err {
            SdrError::LibraryNotFound(lib) => ProbeError::DependencyMissing(vec![lib]),
            SdrError::DeviceNotFound(msg) => ProbeError::DeviceNotFound(msg),
            SdrError::OpenFailed(msg) => ProbeError::DeviceOpenFailed(msg),
            SdrError::ConfigError(msg) => ProbeError::ConfigurationFailed(msg),
            other @ (SdrError::StreamSetup(_)
            | SdrError::Timeout
            | SdrError::Stream { .. }
            | SdrError::NotStarted) => ProbeError::StreamError(other.to_string()),
        }
    }
}

impl From<IntegrityError> for ProbeError {
    fn from(err: IntegrityError) -> Self {
        match err {
            IntegrityError::InsufficientSamples { read, requested } => {
                ProbeError::InsufficientSamples {
                    read,
                    requested,
                    cause: None,
                }
            }
            IntegrityError::AllZeroSignal => ProbeError::AllZeroSignal { cause: None },
        }
    }
}
