//! Validation pipeline: discover, configure, capture, check, estimate, report.

use std::path::PathBuf;

use sdrprobe_core::analysis::{self, SpectralEstimate};
use sdrprobe_sim::capture::{capture, CaptureConfig, CaptureResult};
use sdrprobe_sim::hal::{DeviceUri, DriverRegistry, StreamConfig};
use sdrprobe_sim::SdrConfig;

use crate::deps::check_dependencies;
use crate::error::ProbeError;
use crate::report::{self, ReportConfig, RunMetadata};

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub device: DeviceUri,
    pub sdr: SdrConfig,
    pub capture: CaptureConfig,
    pub output: PathBuf,
    pub json: Option<PathBuf>,
    pub report: ReportConfig,
}

/// Products of a successful run.
#[derive(Debug)]
pub struct RunOutcome {
    pub metadata: RunMetadata,
    pub capture: CaptureResult,
    pub estimate: SpectralEstimate,
}

/// Run the full validation against the drivers in `registry`.
pub fn run(options: &RunOptions, registry: &DriverRegistry) -> Result<RunOutcome, ProbeError> {
    let missing = check_dependencies(registry, &options.device);
    if !missing.is_empty() {
        return Err(ProbeError::DependencyMissing(missing));
    }

    tracing::info!("Searching for devices at {}", options.device);
    let devices = registry.discover(&options.device)?;
    if devices.is_empty() {
        return Err(ProbeError::DeviceNotFound(format!(
            "nothing matches {}",
            options.device
        )));
    }
    tracing::info!("Found {} device(s)", devices.len());

    let mut device = registry.open(&options.device)?;
    tracing::info!("Opened {} ({})", device.name(), device.info().driver);

    let sdr = &options.sdr;
    tracing::info!(
        "Configuring: freq={} MHz, bw={} MHz, gain={} dB, channel={}",
        sdr.frequency / 1e6,
        sdr.sample_rate / 1e6,
        sdr.rx_gain,
        sdr.channel
    );
    device.configure(sdr)?;
    let applied = device.config().clone();

    let mut stream = device.create_rx_stream(StreamConfig {
        buffer_size: options.capture.chunk_limit,
        ..StreamConfig::for_channel(sdr.channel)
    })?;
    let captured = capture(stream.as_mut(), &options.capture)?;
    drop(stream);
    drop(device);

    let result = captured.result;
    captured
        .buffer
        .check_integrity()
        .map_err(|e| ProbeError::from(e).with_stream_cause(result.error.as_ref()))?;

    let estimate = analysis::estimate(
        captured.buffer.valid(),
        result.filled,
        applied.sample_rate,
        applied.frequency,
    )?;

    let metadata = RunMetadata {
        device: options.device.to_string(),
        center_freq_mhz: applied.frequency / 1e6,
        bandwidth_mhz: applied.sample_rate / 1e6,
        gain_db: applied.rx_gain,
        channel: sdr.channel.label().to_string(),
        captured: result.filled,
        requested: result.requested,
    };

    report::write_report(&options.output, &estimate, &metadata, &options.report)
        .map_err(ProbeError::ReportFailed)?;
    tracing::info!("Spectrum image saved to: {}", options.output.display());

    if let Some(path) = &options.json {
        report::write_json(path, &metadata, &result, &estimate).map_err(ProbeError::ReportFailed)?;
        tracing::info!("Run summary saved to: {}", path.display());
    }

    tracing::info!("SDR hardware validation successful");
    Ok(RunOutcome {
        metadata,
        capture: result,
        estimate,
    })
}
