//! sdrprobe: SDR hardware validation
//!
//! Captures a block of samples from a receiver, rejects empty or dead
//! captures, and saves a spectrum plus spectrogram image.
//!
//! ```text
//! sdrprobe -f 433.92 -b 2 -g 40 -c 0 -o /tmp/s1g.png
//! sdrprobe -d 'simulator://tone_hz=250000,timeout_every=5' --json run.json
//! ```
//!
//! Exit codes: 0 success, 1 device error, 2 capture error, 3 missing
//! dependency.

mod deps;
mod error;
mod report;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;

use sdrprobe_core::observe::{init_logging, LogConfig, LogFormat};
use sdrprobe_sim::capture::CaptureConfig;
use sdrprobe_sim::hal::{create_default_registry, DeviceUri};
use sdrprobe_sim::{Channel, SdrConfig};

use crate::error::ProbeError;
use crate::report::{Colormap, ReportConfig};
use crate::run::RunOptions;

#[derive(Parser, Debug)]
#[command(name = "sdrprobe")]
#[command(version, about = "SDR hardware validation: capture, check and plot a spectrum", long_about = None)]
struct Cli {
    /// Center frequency in MHz
    #[arg(short, long, default_value_t = 100.0)]
    freq: f64,

    /// Bandwidth (sample rate) in MHz
    #[arg(short, long, default_value_t = 2.0)]
    bandwidth: f64,

    /// RX gain in dB
    #[arg(short, long, default_value_t = 50.0)]
    gain: f64,

    /// Number of samples to capture
    #[arg(short = 'n', long, default_value_t = 262_144,
          value_parser = clap::value_parser!(u64).range(1..))]
    samples: u64,

    /// Output image path
    #[arg(short, long, default_value = "/tmp/cariboulite_spectrum.png")]
    output: PathBuf,

    /// Channel: 0=S1G, 1=HiF
    #[arg(short, long, default_value_t = 1,
          value_parser = clap::value_parser!(u8).range(0..=1))]
    channel: u8,

    /// Device URI (soapysdr://key=value,... or simulator://key=value,...)
    #[arg(short, long, default_value = "soapysdr://driver=Cariboulite")]
    device: String,

    /// Give up after this many read timeouts (default: retry forever)
    #[arg(long)]
    max_timeouts: Option<usize>,

    /// Give up after this many seconds of capturing
    #[arg(long)]
    deadline: Option<f64>,

    /// Also write a JSON run summary here
    #[arg(long)]
    json: Option<PathBuf>,

    /// Spectrogram colormap
    #[arg(long, value_enum, default_value_t = Colormap::Viridis)]
    colormap: Colormap,

    /// Suppress all output
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log format: compact, pretty or json
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

impl Cli {
    fn options(&self) -> Result<RunOptions, ProbeError> {
        let channel = Channel::from_index(self.channel)
            .ok_or_else(|| ProbeError::ConfigurationFailed(format!("invalid channel {}", self.channel)))?;

        let mut device = DeviceUri::parse(&self.device)?;
        if device.driver == "soapysdr" {
            device = device.with_default("channel", channel.label());
        }

        let total = usize::try_from(self.samples)
            .map_err(|_| ProbeError::ConfigurationFailed(format!("{} samples is too many", self.samples)))?;
        let mut capture = CaptureConfig::new(total);
        capture.max_timeouts = self.max_timeouts;
        if let Some(secs) = self.deadline {
            let deadline = Duration::try_from_secs_f64(secs)
                .map_err(|e| ProbeError::ConfigurationFailed(format!("deadline {}: {}", secs, e)))?;
            capture = capture.with_deadline(deadline);
        }

        Ok(RunOptions {
            device,
            sdr: SdrConfig::from_mhz(self.freq, self.bandwidth, self.gain, channel),
            capture,
            output: self.output.clone(),
            json: self.json.clone(),
            report: ReportConfig {
                colormap: self.colormap,
                ..Default::default()
            },
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(&LogConfig::for_cli(cli.verbose, cli.log_format));
    }

    let outcome = cli
        .options()
        .and_then(|options| run::run(&options, &create_default_registry()));

    match outcome {
        Ok(outcome) => {
            tracing::info!(
                peak_db = format_args!("{:.1}", outcome.estimate.summary.peak_db),
                noise_floor_db = format_args!("{:.1}", outcome.estimate.summary.noise_floor_db),
                "{}: captured {}/{} samples",
                outcome.metadata.device,
                outcome.capture.filled,
                outcome.capture.requested
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(stage = e.stage(), "{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
