//! Software SDR Simulator
//!
//! A pure-software receiver for running the validation pipeline without
//! hardware. It produces a complex tone plus white Gaussian noise and can
//! inject the faults a real front end shows: read timeouts, stream errors
//! after a number of samples, and a dead (all-zero) signal.
//!
//! ## Device arguments
//!
//! ```text
//! simulator://tone_hz=100000,snr_db=30,seed=7,timeout_every=3,fail_after=50000
//! ```
//!
//! | key             | meaning                                          | default |
//! |-----------------|--------------------------------------------------|---------|
//! | `tone_hz`       | tone offset from the tuned center, Hz            | 100000  |
//! | `amplitude`     | tone amplitude                                   | 0.5     |
//! | `snr_db`        | tone-to-noise power ratio, dB                    | 30      |
//! | `seed`          | RNG seed for reproducible noise                  | random  |
//! | `mtu`           | most samples returned per read                   | 4096    |
//! | `timeout_every` | every k-th read times out (0 = never)            | 0       |
//! | `fail_after`    | stream error once this many samples were read    | none    |
//! | `fail_code`     | status code of that error                        | -4      |
//! | `zeros`         | deliver exact zeros                              | false   |
//! | `devices`       | devices reported by discovery                    | 1       |
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  SimulatedStream                     │
//! │                                                      │
//! │  tone (cis) ──► + ◄── AWGN (Normal, seeded StdRng)   │
//! │                 │                                    │
//! │          fault schedule (timeouts, errors, zeros)    │
//! │                 │                                    │
//! │               read()                                 │
//! └──────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use sdrprobe_core::types::{complex_ops::cis, IQSample};

use crate::device::{DeviceInfo, SdrConfig, SdrError, SdrResult};
use crate::hal::{
    apply_tuning, format_device_args, DeviceDriver, SdrDeviceExt, StreamConfig, StreamHandle,
    TunerControl,
};

/// Simulated signal and fault schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Tone offset from the tuned center in Hz
    pub tone_hz: f64,
    /// Tone amplitude
    pub amplitude: f64,
    /// Tone-to-noise power ratio in dB
    pub snr_db: f64,
    /// Noise seed; `None` seeds from the OS
    pub seed: Option<u64>,
    /// Maximum samples per read
    pub mtu: usize,
    /// Every k-th read times out; 0 disables
    pub timeout_every: usize,
    /// Fail the stream once this many samples were delivered
    pub fail_after: Option<usize>,
    /// Status code reported by that failure
    pub fail_code: i32,
    /// Deliver exact zeros
    pub zeros: bool,
    /// Number of devices discovery reports
    pub devices: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tone_hz: 100e3,
            amplitude: 0.5,
            snr_db: 30.0,
            seed: None,
            mtu: 4096,
            timeout_every: 0,
            fail_after: None,
            fail_code: -4,
            zeros: false,
            devices: 1,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> SdrResult<T> {
    value.parse().map_err(|_| {
        SdrError::ConfigError(format!("simulator: invalid value '{}' for '{}'", value, key))
    })
}

impl SimulatorConfig {
    /// Build from device arguments. Unknown keys are rejected.
    pub fn from_args(args: &HashMap<String, String>) -> SdrResult<Self> {
        let mut config = Self::default();
        for (key, value) in args {
            match key.as_str() {
                "tone_hz" => config.tone_hz = parse_value(key, value)?,
                "amplitude" => config.amplitude = parse_value(key, value)?,
                "snr_db" => config.snr_db = parse_value(key, value)?,
                "seed" => config.seed = Some(parse_value(key, value)?),
                "mtu" => config.mtu = parse_value(key, value)?,
                "timeout_every" => config.timeout_every = parse_value(key, value)?,
                "fail_after" => config.fail_after = Some(parse_value(key, value)?),
                "fail_code" => config.fail_code = parse_value(key, value)?,
                "zeros" => config.zeros = parse_value(key, value)?,
                "devices" => config.devices = parse_value(key, value)?,
                // front-end selection, meaningless here
                "channel" => {}
                other => {
                    return Err(SdrError::ConfigError(format!(
                        "simulator: unknown argument '{}'",
                        other
                    )))
                }
            }
        }
        if config.mtu == 0 {
            return Err(SdrError::ConfigError("simulator: mtu must be > 0".to_string()));
        }
        if config.fail_code >= 0 {
            return Err(SdrError::ConfigError(
                "simulator: fail_code must be negative".to_string(),
            ));
        }
        Ok(config)
    }

    /// Per-component standard deviation of the noise.
    fn noise_std(&self) -> f64 {
        let signal_power = self.amplitude * self.amplitude;
        let noise_power = signal_power / 10.0_f64.powf(self.snr_db / 10.0);
        (noise_power / 2.0).sqrt()
    }
}

/// Driver for `simulator://` URIs.
#[derive(Debug, Default)]
pub struct SimulatorDriver;

impl SimulatorDriver {
    pub fn new() -> Self {
        Self
    }
}

impl DeviceDriver for SimulatorDriver {
    fn name(&self) -> &str {
        "simulator"
    }

    fn discover(&self, args: &HashMap<String, String>) -> SdrResult<Vec<DeviceInfo>> {
        let config = SimulatorConfig::from_args(args)?;
        Ok((0..config.devices)
            .map(|i| DeviceInfo {
                driver: "simulator".to_string(),
                serial: format!("SIM{:03}", i + 1),
                label: "Software Simulator".to_string(),
                address: format!("simulator://{}", format_device_args(args)),
            })
            .collect())
    }

    fn open(&self, args: &HashMap<String, String>) -> SdrResult<Box<dyn SdrDeviceExt>> {
        let config = SimulatorConfig::from_args(args)?;
        if config.devices == 0 {
            return Err(SdrError::OpenFailed("no simulated device present".to_string()));
        }
        let info = DeviceInfo {
            driver: "simulator".to_string(),
            serial: "SIM001".to_string(),
            label: "Software Simulator".to_string(),
            address: format!("simulator://{}", format_device_args(args)),
        };
        Ok(Box::new(Simulator::new(info, config)))
    }
}

/// Simulated receiver.
pub struct Simulator {
    info: DeviceInfo,
    config: SdrConfig,
    sim: SimulatorConfig,
}

impl Simulator {
    pub fn new(info: DeviceInfo, sim: SimulatorConfig) -> Self {
        Self {
            info,
            config: SdrConfig::default(),
            sim,
        }
    }
}

impl SdrDeviceExt for Simulator {
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
        self.config = apply_tuning(self, config)?;
        Ok(())
    }

    fn create_rx_stream(&mut self, _config: StreamConfig) -> SdrResult<Box<dyn StreamHandle>> {
        Ok(Box::new(SimulatedStream::new(
            self.sim.clone(),
            self.config.sample_rate,
        )?))
    }
}

impl TunerControl for Simulator {
    fn set_sample_rate(&mut self, _channel: usize, rate: f64) -> SdrResult<f64> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SdrError::ConfigError(format!("invalid sample rate {} Hz", rate)));
        }
        self.config.sample_rate = rate;
        Ok(rate)
    }

    fn set_frequency(&mut self, _channel: usize, freq_hz: f64) -> SdrResult<f64> {
        if !freq_hz.is_finite() || freq_hz < 0.0 {
            return Err(SdrError::ConfigError(format!("invalid frequency {} Hz", freq_hz)));
        }
        self.config.frequency = freq_hz;
        Ok(freq_hz)
    }

    fn set_rx_gain(&mut self, _channel: usize, gain_db: f64) -> SdrResult<f64> {
        if !gain_db.is_finite() {
            return Err(SdrError::ConfigError(format!("invalid gain {} dB", gain_db)));
        }
        self.config.rx_gain = gain_db;
        Ok(gain_db)
    }
}

/// Stream of synthesized samples following the fault schedule.
pub struct SimulatedStream {
    sim: SimulatorConfig,
    sample_rate: f64,
    rng: StdRng,
    noise: Normal<f64>,
    reads: usize,
    delivered: usize,
    running: bool,
    closed: bool,
}

impl SimulatedStream {
    pub fn new(sim: SimulatorConfig, sample_rate: f64) -> SdrResult<Self> {
        let noise = Normal::new(0.0, sim.noise_std())
            .map_err(|e| SdrError::ConfigError(format!("simulator noise: {}", e)))?;
        let rng = match sim.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            sim,
            sample_rate,
            rng,
            noise,
            reads: 0,
            delivered: 0,
            running: false,
            closed: false,
        })
    }

    /// Samples delivered so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }
}

impl StreamHandle for SimulatedStream {
    fn start(&mut self) -> SdrResult<()> {
        if self.closed {
            return Err(SdrError::StreamSetup("stream already closed".to_string()));
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> SdrResult<()> {
        self.running = false;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [IQSample], _timeout: Duration) -> SdrResult<usize> {
        if !self.running {
            return Err(SdrError::NotStarted);
        }
        self.reads += 1;

        if self.sim.timeout_every > 0 && self.reads % self.sim.timeout_every == 0 {
            return Err(SdrError::Timeout);
        }

        let mut n = buffer.len().min(self.sim.mtu);
        if let Some(limit) = self.sim.fail_after {
            if self.delivered >= limit {
                return Err(SdrError::Stream {
                    code: self.sim.fail_code,
                    message: "simulated stream failure".to_string(),
                });
            }
            n = n.min(limit - self.delivered);
        }

        for (i, dst) in buffer[..n].iter_mut().enumerate() {
            *dst = if self.sim.zeros {
                IQSample::new(0.0, 0.0)
            } else {
                let idx = self.delivered + i;
                let tone = cis(self.sim.tone_hz, idx, self.sample_rate) * self.sim.amplitude;
                let noise = IQSample::new(
                    self.noise.sample(&mut self.rng),
                    self.noise.sample(&mut self.rng),
                );
                tone + noise
            };
        }

        self.delivered += n;
        Ok(n)
    }

    fn close(&mut self) -> SdrResult<()> {
        self.running = false;
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::parse_device_args;
    use approx::assert_relative_eq;

    fn stream(args: &str) -> SimulatedStream {
        let config = SimulatorConfig::from_args(&parse_device_args(args)).unwrap();
        let mut stream = SimulatedStream::new(config, 1e6).unwrap();
        stream.start().unwrap();
        stream
    }

    #[test]
    fn test_config_from_args() {
        let args = parse_device_args("tone_hz=250000,snr_db=10,seed=42,zeros=true,channel=HiF");
        let config = SimulatorConfig::from_args(&args).unwrap();
        assert_eq!(config.tone_hz, 250e3);
        assert_eq!(config.snr_db, 10.0);
        assert_eq!(config.seed, Some(42));
        assert!(config.zeros);
    }

    #[test]
    fn test_config_rejects_unknown_and_bad_values() {
        assert!(matches!(
            SimulatorConfig::from_args(&parse_device_args("bogus=1")),
            Err(SdrError::ConfigError(_))
        ));
        assert!(SimulatorConfig::from_args(&parse_device_args("snr_db=loud")).is_err());
        assert!(SimulatorConfig::from_args(&parse_device_args("mtu=0")).is_err());
        assert!(SimulatorConfig::from_args(&parse_device_args("fail_code=3")).is_err());
    }

    #[test]
    fn test_read_respects_mtu() {
        let mut s = stream("mtu=100,seed=1");
        let mut buf = vec![IQSample::new(0.0, 0.0); 4096];
        assert_eq!(s.read(&mut buf, Duration::from_secs(1)).unwrap(), 100);
        assert!(buf[..100].iter().any(|x| x.norm() > 0.0));
    }

    #[test]
    fn test_read_before_start_fails() {
        let config = SimulatorConfig::default();
        let mut s = SimulatedStream::new(config, 1e6).unwrap();
        let mut buf = vec![IQSample::new(0.0, 0.0); 16];
        assert_eq!(
            s.read(&mut buf, Duration::from_secs(1)),
            Err(SdrError::NotStarted)
        );
    }

    #[test]
    fn test_timeout_schedule() {
        let mut s = stream("timeout_every=2,seed=1");
        let mut buf = vec![IQSample::new(0.0, 0.0); 64];
        assert!(s.read(&mut buf, Duration::from_secs(1)).is_ok());
        assert_eq!(s.read(&mut buf, Duration::from_secs(1)), Err(SdrError::Timeout));
        assert!(s.read(&mut buf, Duration::from_secs(1)).is_ok());
        assert_eq!(s.delivered(), 128);
    }

    #[test]
    fn test_fail_after_truncates_then_errors() {
        let mut s = stream("fail_after=100,fail_code=-2,seed=1");
        let mut buf = vec![IQSample::new(0.0, 0.0); 64];
        assert_eq!(s.read(&mut buf, Duration::from_secs(1)).unwrap(), 64);
        assert_eq!(s.read(&mut buf, Duration::from_secs(1)).unwrap(), 36);
        match s.read(&mut buf, Duration::from_secs(1)) {
            Err(SdrError::Stream { code, .. }) => assert_eq!(code, -2),
            other => panic!("expected stream error, got {:?}", other),
        }
    }

    #[test]
    fn test_noiseless_tone_power() {
        let mut s = stream("amplitude=0.5,snr_db=300,seed=3");
        let mut buf = vec![IQSample::new(0.0, 0.0); 1024];
        s.read(&mut buf, Duration::from_secs(1)).unwrap();
        let power = sdrprobe_core::types::complex_ops::average_power(&buf);
        assert_relative_eq!(power, 0.25, epsilon = 1e-9);
    }

    #[test]
    fn test_zeros() {
        let mut s = stream("zeros=true");
        let mut buf = vec![IQSample::new(1.0, 1.0); 256];
        s.read(&mut buf, Duration::from_secs(1)).unwrap();
        assert!(buf.iter().all(|x| *x == IQSample::new(0.0, 0.0)));
    }

    #[test]
    fn test_seed_is_reproducible() {
        let mut a = stream("seed=9");
        let mut b = stream("seed=9");
        let mut buf_a = vec![IQSample::new(0.0, 0.0); 32];
        let mut buf_b = vec![IQSample::new(0.0, 0.0); 32];
        a.read(&mut buf_a, Duration::from_secs(1)).unwrap();
        b.read(&mut buf_b, Duration::from_secs(1)).unwrap();
        assert_eq!(buf_a, buf_b);
    }

    #[test]
    fn test_driver_discovery_count() {
        let driver = SimulatorDriver::new();
        assert_eq!(driver.discover(&parse_device_args("")).unwrap().len(), 1);
        assert!(driver.discover(&parse_device_args("devices=0")).unwrap().is_empty());
    }

    #[test]
    fn test_simulator_rejects_bad_tuning() {
        let driver = SimulatorDriver::new();
        let mut device = driver.open(&parse_device_args("seed=1")).unwrap();
        let mut config = SdrConfig::default();
        config.sample_rate = 0.0;
        assert!(matches!(
            device.configure(&config),
            Err(SdrError::ConfigError(_))
        ));
        assert!(device.configure(&SdrConfig::default()).is_ok());
    }
}
