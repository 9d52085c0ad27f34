//! Spectral estimation
//!
//! Turns a validated capture into the three diagnostic products:
//!
//! - [`PowerSpectrum`]: Welch averaged spectrum over the whole capture
//! - [`SummaryStats`]: peak, noise floor and dynamic range of that spectrum
//! - [`Spectrogram`]: short-time spectra over the head of the capture
//!
//! ## Example
//!
//! ```rust
//! use sdrprobe_core::analysis::estimate;
//! use sdrprobe_core::types::complex_ops::cis;
//!
//! let samples: Vec<_> = (0..10_000).map(|i| cis(125e3, i, 2e6)).collect();
//! let est = estimate(&samples, samples.len(), 2e6, 100e6).unwrap();
//! assert_eq!(est.spectrum.fft_size, 4096);
//! assert_eq!(est.spectrum.num_segments, 2);
//! assert!(est.summary.dynamic_range_db > 0.0);
//! ```

pub mod spectrogram;
pub mod summary;
pub mod welch;

pub use spectrogram::{Spectrogram, SpectrogramConfig};
pub use summary::{median, SummaryStats};
pub use welch::{welch_spectrum, PowerSpectrum, SpectralPeak, WelchConfig, WelchEstimator};

use crate::types::{DspError, DspResult, IQSample};

/// Everything the report needs from one capture.
#[derive(Debug, Clone)]
pub struct SpectralEstimate {
    pub spectrum: PowerSpectrum,
    pub summary: SummaryStats,
    pub spectrogram: Spectrogram,
}

/// Estimate spectrum, summary and spectrogram of `samples[..sample_count]`.
pub fn estimate(
    samples: &[IQSample],
    sample_count: usize,
    sample_rate: f64,
    center_freq: f64,
) -> DspResult<SpectralEstimate> {
    if sample_count == 0 {
        return Err(DspError::EmptyCapture);
    }
    if sample_count > samples.len() {
        return Err(DspError::BufferTooShort {
            expected: sample_count,
            actual: samples.len(),
        });
    }
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(DspError::InvalidSampleRate(sample_rate));
    }

    let samples = &samples[..sample_count];
    let spectrum = welch_spectrum(samples, sample_rate, center_freq)?;
    let summary = SummaryStats::from_spectrum(&spectrum).ok_or(DspError::EmptyCapture)?;
    let spectrogram =
        Spectrogram::compute(samples, sample_rate, center_freq, &SpectrogramConfig::default())?;

    tracing::info!(
        peak_db = format_args!("{:.1}", summary.peak_db),
        noise_floor_db = format_args!("{:.1}", summary.noise_floor_db),
        dynamic_range_db = format_args!("{:.1}", summary.dynamic_range_db),
        "Spectral estimate ready"
    );

    Ok(SpectralEstimate {
        spectrum,
        summary,
        spectrogram,
    })
}
