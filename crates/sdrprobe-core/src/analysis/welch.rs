//! Welch power spectrum
//!
//! Averaged periodogram over contiguous, non-overlapping segments. The FFT
//! size is capped at [`DEFAULT_FFT_SIZE`]; shorter captures collapse to a
//! single segment spanning the whole capture. Any tail that does not fill a
//! segment is dropped, never zero-padded.
//!
//! ```text
//! samples:  [ seg 0 | seg 1 | ... | seg k-1 | tail ]
//!              │       │             │
//!           window → FFT → shift → |X|² ──► Σ / k ──► 10·log10(· + ε)
//! ```

use std::fmt::Write as _;

use crate::fft_utils::FftProcessor;
use crate::types::{power_to_db, DspError, DspResult, IQSample};
use crate::window::Window;

/// Largest FFT used for the averaged spectrum.
pub const DEFAULT_FFT_SIZE: usize = 4096;

/// Welch estimator configuration.
#[derive(Debug, Clone)]
pub struct WelchConfig {
    /// Upper bound on the segment length
    pub max_fft_size: usize,
    /// Segment taper
    pub window: Window,
}

impl Default for WelchConfig {
    fn default() -> Self {
        Self {
            max_fft_size: DEFAULT_FFT_SIZE,
            window: Window::Hann,
        }
    }
}

/// Averaged power spectrum in display (DC-centred) order.
#[derive(Debug, Clone)]
pub struct PowerSpectrum {
    /// Power per bin in dB
    pub power_db: Vec<f64>,
    /// Baseband bin frequencies in Hz, ascending
    pub frequencies: Vec<f64>,
    /// Tuned center frequency in Hz
    pub center_freq: f64,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Segment length
    pub fft_size: usize,
    /// Number of averaged segments
    pub num_segments: usize,
}

/// Strongest bin of a spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralPeak {
    /// Bin index in display order
    pub index: usize,
    /// Absolute frequency in Hz
    pub frequency: f64,
    /// Power in dB
    pub power_db: f64,
}

impl PowerSpectrum {
    pub fn len(&self) -> usize {
        self.power_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power_db.is_empty()
    }

    /// Frequency resolution in Hz.
    pub fn resolution(&self) -> f64 {
        self.sample_rate / self.fft_size as f64
    }

    /// `(baseband_frequency_hz, power_db)` pairs.
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.power_db.iter().copied())
    }

    /// Absolute frequency axis in MHz.
    pub fn freq_mhz(&self) -> Vec<f64> {
        self.frequencies
            .iter()
            .map(|f| (f + self.center_freq) / 1e6)
            .collect()
    }

    /// The maximum bin, or `None` for an empty spectrum.
    pub fn peak(&self) -> Option<SpectralPeak> {
        self.power_db
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(index, &power_db)| SpectralPeak {
                index,
                frequency: self.center_freq + self.frequencies[index],
                power_db,
            })
    }

    /// Render as `frequency_mhz,power_db` CSV with a header row.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(self.len() * 24 + 24);
        out.push_str("frequency_mhz,power_db\n");
        for (mhz, db) in self.freq_mhz().iter().zip(self.power_db.iter()) {
            let _ = writeln!(out, "{:.6},{:.3}", mhz, db);
        }
        out
    }
}

/// Welch power spectrum estimator.
#[derive(Debug, Clone)]
pub struct WelchEstimator {
    config: WelchConfig,
}

impl WelchEstimator {
    pub fn new(config: WelchConfig) -> Self {
        Self { config }
    }

    /// Segment length used for `sample_count` samples.
    pub fn fft_size_for(&self, sample_count: usize) -> usize {
        if sample_count >= self.config.max_fft_size {
            self.config.max_fft_size
        } else {
            sample_count
        }
    }

    /// Estimate the averaged spectrum of `samples`.
    pub fn estimate(
        &self,
        samples: &[IQSample],
        sample_rate: f64,
        center_freq: f64,
    ) -> DspResult<PowerSpectrum> {
        if samples.is_empty() {
            return Err(DspError::EmptyCapture);
        }

        let fft_size = self.fft_size_for(samples.len());
        let num_segments = samples.len() / fft_size;
        let window = self.config.window.coefficients(fft_size);
        let mut processor = FftProcessor::new(fft_size);

        let mut accum = vec![0.0f64; fft_size];
        let mut frame = vec![IQSample::new(0.0, 0.0); fft_size];

        for segment in samples.chunks_exact(fft_size).take(num_segments) {
            for ((dst, &s), &w) in frame.iter_mut().zip(segment).zip(window.iter()) {
                *dst = s * w;
            }
            processor.fft_inplace(&mut frame);

            let shifted = FftProcessor::fft_shift(&frame);
            for (acc, x) in accum.iter_mut().zip(shifted.iter()) {
                *acc += x.norm_sqr();
            }
        }

        let power_db = accum
            .iter()
            .map(|&p| power_to_db(p / num_segments as f64))
            .collect();

        tracing::debug!(fft_size, num_segments, "Welch spectrum computed");

        Ok(PowerSpectrum {
            power_db,
            frequencies: FftProcessor::shifted_frequencies(fft_size, sample_rate),
            center_freq,
            sample_rate,
            fft_size,
            num_segments,
        })
    }
}

/// Welch spectrum with the default configuration.
pub fn welch_spectrum(
    samples: &[IQSample],
    sample_rate: f64,
    center_freq: f64,
) -> DspResult<PowerSpectrum> {
    WelchEstimator::new(WelchConfig::default()).estimate(samples, sample_rate, center_freq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::complex_ops::cis;
    use approx::assert_relative_eq;

    fn tone(n: usize, freq: f64, sample_rate: f64) -> Vec<IQSample> {
        (0..n).map(|i| cis(freq, i, sample_rate)).collect()
    }

    #[test]
    fn test_segment_count_drops_tail() {
        let samples = tone(10_000, 1e3, 1e6);
        let spectrum = welch_spectrum(&samples, 1e6, 0.0).unwrap();
        assert_eq!(spectrum.fft_size, 4096);
        assert_eq!(spectrum.num_segments, 2);
        assert_eq!(spectrum.len(), 4096);
        assert_eq!(spectrum.frequencies.len(), 4096);
    }

    #[test]
    fn test_short_capture_single_segment() {
        let samples = tone(1000, 1e3, 1e6);
        let spectrum = welch_spectrum(&samples, 1e6, 0.0).unwrap();
        assert_eq!(spectrum.fft_size, 1000);
        assert_eq!(spectrum.num_segments, 1);
    }

    #[test]
    fn test_tone_peak_within_one_bin() {
        let sample_rate = 2e6;
        let offset = 250e3;
        let center = 100e6;
        let samples = tone(16_384, offset, sample_rate);

        let spectrum = welch_spectrum(&samples, sample_rate, center).unwrap();
        let peak = spectrum.peak().unwrap();

        assert!(
            (peak.frequency - (center + offset)).abs() <= spectrum.resolution(),
            "peak at {} Hz, expected {} Hz",
            peak.frequency,
            center + offset
        );
    }

    #[test]
    fn test_dc_lands_at_center_index() {
        let samples = vec![IQSample::new(1.0, 0.0); 8192];
        let spectrum = welch_spectrum(&samples, 1e6, 0.0).unwrap();
        let peak = spectrum.peak().unwrap();
        assert_eq!(peak.index, spectrum.fft_size / 2);
        assert_relative_eq!(spectrum.frequencies[peak.index], 0.0);
    }

    #[test]
    fn test_single_sample_capture() {
        let samples = vec![IQSample::new(0.5, 0.5)];
        let spectrum = welch_spectrum(&samples, 1e6, 0.0).unwrap();
        assert_eq!(spectrum.fft_size, 1);
        assert_relative_eq!(spectrum.power_db[0], power_to_db(0.5), epsilon = 1e-9);
    }

    #[test]
    fn test_zero_input_is_finite() {
        let samples = vec![IQSample::new(0.0, 0.0); 4096];
        let spectrum = welch_spectrum(&samples, 1e6, 0.0).unwrap();
        assert!(spectrum.power_db.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_empty_capture_rejected() {
        assert_eq!(
            welch_spectrum(&[], 1e6, 0.0).unwrap_err(),
            DspError::EmptyCapture
        );
    }

    #[test]
    fn test_freq_axis_offset_by_center() {
        let samples = tone(4096, 0.0, 2e6);
        let spectrum = welch_spectrum(&samples, 2e6, 433.92e6).unwrap();
        let mhz = spectrum.freq_mhz();
        assert_relative_eq!(mhz[0], 432.92, epsilon = 1e-9);
        assert_relative_eq!(mhz[2048], 433.92, epsilon = 1e-9);
    }

    #[test]
    fn test_csv_has_header_and_all_bins() {
        let samples = tone(64, 0.0, 64.0);
        let spectrum = welch_spectrum(&samples, 64.0, 0.0).unwrap();
        let csv = spectrum.to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("frequency_mhz,power_db"));
        assert_eq!(lines.count(), 64);
    }
}
