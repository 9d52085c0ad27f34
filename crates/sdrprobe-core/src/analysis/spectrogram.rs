//! Short-time power spectrogram
//!
//! Two-sided STFT over the head of the capture. Each segment is
//! mean-detrended, tapered with a periodic Tukey window, transformed and
//! scaled as a power spectral density `|X|² / (fs · Σw²)`.
//!
//! ```text
//! |<- nperseg ->|
//! [=============]
//!        [=============]
//!               [=============]
//! |<-hop->|
//! ```
//!
//! Rows are time bins, columns are DC-centred frequency bins.

use crate::fft_utils::FftProcessor;
use crate::types::{power_to_db, DspError, DspResult, IQSample};
use crate::window::{power_sum, Window};

/// Spectrogram configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramConfig {
    /// Segment length
    pub nperseg: usize,
    /// Samples shared by consecutive segments
    pub noverlap: usize,
    /// Only the first `max_samples` samples are analysed
    pub max_samples: usize,
    /// Tukey taper fraction
    pub tukey_alpha: f64,
}

impl Default for SpectrogramConfig {
    fn default() -> Self {
        Self {
            nperseg: 256,
            noverlap: 128,
            max_samples: 65_536,
            tukey_alpha: 0.25,
        }
    }
}

impl SpectrogramConfig {
    /// Segment geometry for `available` samples.
    ///
    /// Captures shorter than one segment use a single segment covering all of
    /// them with half overlap.
    fn geometry(&self, available: usize) -> (usize, usize) {
        if available < self.nperseg {
            (available, available / 2)
        } else {
            (self.nperseg, self.noverlap.min(self.nperseg - 1))
        }
    }
}

/// Time-frequency power grid.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Power density in dB, `[time_bin][freq_bin]`
    pub power_db: Vec<Vec<f64>>,
    /// Segment centre times in milliseconds
    pub time_ms: Vec<f64>,
    /// Absolute bin frequencies in MHz, ascending
    pub freq_mhz: Vec<f64>,
    /// Segment length used
    pub nperseg: usize,
    /// Overlap used
    pub noverlap: usize,
}

impl Spectrogram {
    /// Compute the spectrogram of `samples`.
    pub fn compute(
        samples: &[IQSample],
        sample_rate: f64,
        center_freq: f64,
        config: &SpectrogramConfig,
    ) -> DspResult<Self> {
        let head = &samples[..samples.len().min(config.max_samples)];
        if head.is_empty() {
            return Err(DspError::EmptyCapture);
        }

        let (nperseg, noverlap) = config.geometry(head.len());
        let hop = nperseg - noverlap;
        let num_segments = (head.len() - nperseg) / hop + 1;

        let window = Window::Tukey {
            alpha: config.tukey_alpha,
        }
        .coefficients(nperseg);
        let scale = 1.0 / (sample_rate * power_sum(&window));
        let mut processor = FftProcessor::new(nperseg);
        let mut frame = vec![IQSample::new(0.0, 0.0); nperseg];

        let mut power_db = Vec::with_capacity(num_segments);
        let mut time_ms = Vec::with_capacity(num_segments);

        for k in 0..num_segments {
            let start = k * hop;
            let segment = &head[start..start + nperseg];
            let mean = segment.iter().sum::<IQSample>() / nperseg as f64;

            for ((dst, &s), &w) in frame.iter_mut().zip(segment).zip(window.iter()) {
                *dst = (s - mean) * w;
            }
            processor.fft_inplace(&mut frame);

            let row: Vec<f64> = frame
                .iter()
                .map(|x| power_to_db(x.norm_sqr() * scale))
                .collect();
            power_db.push(FftProcessor::fft_shift(&row));

            let centre = start as f64 + nperseg as f64 / 2.0;
            time_ms.push(centre / sample_rate * 1000.0);
        }

        let freq_mhz = FftProcessor::shifted_frequencies(nperseg, sample_rate)
            .into_iter()
            .map(|f| (f + center_freq) / 1e6)
            .collect();

        tracing::debug!(nperseg, noverlap, num_segments, "Spectrogram computed");

        Ok(Self {
            power_db,
            time_ms,
            freq_mhz,
            nperseg,
            noverlap,
        })
    }

    /// Number of time bins.
    pub fn num_times(&self) -> usize {
        self.power_db.len()
    }

    /// Number of frequency bins.
    pub fn num_freqs(&self) -> usize {
        self.freq_mhz.len()
    }

    /// `(min, max)` over the grid, for colour scaling.
    pub fn db_range(&self) -> Option<(f64, f64)> {
        self.power_db
            .iter()
            .flatten()
            .copied()
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
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
    fn test_dimensions_capped_at_head() {
        let samples = tone(262_144, 100e3, 2e6);
        let spec = Spectrogram::compute(&samples, 2e6, 0.0, &SpectrogramConfig::default()).unwrap();

        // (65536 - 256) / 128 + 1
        assert_eq!(spec.num_times(), 511);
        assert_eq!(spec.num_freqs(), 256);
        assert!(spec.power_db.iter().all(|row| row.len() == 256));
    }

    #[test]
    fn test_time_axis_uses_segment_centres() {
        let samples = tone(1024, 0.0, 1e6);
        let spec = Spectrogram::compute(&samples, 1e6, 0.0, &SpectrogramConfig::default()).unwrap();
        assert_relative_eq!(spec.time_ms[0], 0.128, epsilon = 1e-12);
        assert_relative_eq!(spec.time_ms[1], 0.256, epsilon = 1e-12);
        assert_eq!(spec.num_times(), 7);
    }

    #[test]
    fn test_tone_row_peak() {
        let sample_rate = 2e6;
        // bin 32 of 256
        let offset = 32.0 * sample_rate / 256.0;
        let samples = tone(4096, offset, sample_rate);
        let spec = Spectrogram::compute(&samples, sample_rate, 0.0, &SpectrogramConfig::default()).unwrap();

        let row = &spec.power_db[3];
        let peak = row
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .unwrap()
            .0;
        assert_eq!(peak, 128 + 32);
    }

    #[test]
    fn test_constant_signal_is_detrended() {
        let samples = vec![IQSample::new(3.0, -1.0); 1024];
        let spec = Spectrogram::compute(&samples, 1e6, 0.0, &SpectrogramConfig::default()).unwrap();
        // mean removal leaves nothing but the epsilon floor
        for row in &spec.power_db {
            assert!(row.iter().all(|&p| p < -90.0), "row max {:?}", row.iter().cloned().fold(f64::MIN, f64::max));
        }
    }

    #[test]
    fn test_short_capture_fallback() {
        let samples = tone(100, 1e3, 1e6);
        let spec = Spectrogram::compute(&samples, 1e6, 0.0, &SpectrogramConfig::default()).unwrap();
        assert_eq!(spec.nperseg, 100);
        assert_eq!(spec.noverlap, 50);
        assert_eq!(spec.num_times(), 1);
        assert_eq!(spec.num_freqs(), 100);
    }

    #[test]
    fn test_single_sample() {
        let samples = vec![IQSample::new(1.0, 0.0)];
        let spec = Spectrogram::compute(&samples, 1e6, 0.0, &SpectrogramConfig::default()).unwrap();
        assert_eq!(spec.nperseg, 1);
        assert_eq!(spec.noverlap, 0);
        assert_eq!(spec.num_times(), 1);
    }

    #[test]
    fn test_freq_axis_mhz() {
        let samples = tone(512, 0.0, 2e6);
        let spec = Spectrogram::compute(&samples, 2e6, 915e6, &SpectrogramConfig::default()).unwrap();
        assert_relative_eq!(spec.freq_mhz[128], 915.0, epsilon = 1e-9);
        assert_relative_eq!(spec.freq_mhz[0], 914.0, epsilon = 1e-9);
    }

    #[test]
    fn test_db_range() {
        let samples = tone(1024, 50e3, 1e6);
        let spec = Spectrogram::compute(&samples, 1e6, 0.0, &SpectrogramConfig::default()).unwrap();
        let (lo, hi) = spec.db_range().unwrap();
        assert!(lo < hi);
    }
}
