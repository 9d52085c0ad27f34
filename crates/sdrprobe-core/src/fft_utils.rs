//! FFT Utilities for Spectral Estimation
//!
//! Thin wrapper over `rustfft` that keeps a planned forward transform and its
//! scratch buffer together, plus the index helpers every spectral display
//! needs: bin frequencies and the zero-frequency shift.
//!
//! ## Bin layout
//!
//! A raw FFT of length `n` stores DC at index 0, positive frequencies next and
//! negative frequencies in the upper half. Displays want the most negative
//! frequency first:
//!
//! ```text
//! raw:      [ 0 | +1 | +2 | ... | -2 | -1 ]
//! shifted:  [ -n/2 | ... | -1 | 0 | +1 | ... ]
//!                             ^
//!                        index n/2
//! ```

use rustfft::{num_complex::Complex64, Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Forward FFT processor with reusable scratch space
pub struct FftProcessor {
    /// FFT size
    size: usize,
    /// Forward FFT instance
    fft_forward: Arc<dyn Fft<f64>>,
    /// Scratch buffer for FFT operations
    scratch: Vec<Complex64>,
}

impl fmt::Debug for FftProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FftProcessor")
            .field("size", &self.size)
            .finish()
    }
}

impl FftProcessor {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(size);
        let scratch = vec![Complex64::new(0.0, 0.0); fft_forward.get_inplace_scratch_len()];

        Self {
            size,
            fft_forward,
            scratch,
        }
    }

    /// Get the FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute the forward FFT in-place (unnormalized)
    pub fn fft_inplace(&mut self, buffer: &mut [Complex64]) {
        assert_eq!(buffer.len(), self.size);
        self.fft_forward.process_with_scratch(buffer, &mut self.scratch);
    }

    /// FFT shift - move zero frequency to index `n / 2`
    ///
    /// Equivalent to rotating right by `n / 2`, so odd lengths also end up
    /// with DC at `n / 2`.
    pub fn fft_shift<T: Clone>(spectrum: &[T]) -> Vec<T> {
        let n = spectrum.len();
        let split = n - n / 2;
        let mut shifted = Vec::with_capacity(n);
        shifted.extend_from_slice(&spectrum[split..]);
        shifted.extend_from_slice(&spectrum[..split]);
        shifted
    }

    /// Bin center frequencies in raw FFT order.
    ///
    /// Bins `0..=(n-1)/2` are non-negative, the rest wrap to negative
    /// frequencies, spaced `sample_rate / n` apart.
    pub fn bin_frequencies(size: usize, sample_rate: f64) -> Vec<f64> {
        let resolution = sample_rate / size as f64;
        let positive = (size - 1) / 2;
        (0..size)
            .map(|i| {
                if i <= positive {
                    i as f64 * resolution
                } else {
                    (i as i64 - size as i64) as f64 * resolution
                }
            })
            .collect()
    }

    /// Bin frequencies already shifted to display order.
    pub fn shifted_frequencies(size: usize, sample_rate: f64) -> Vec<f64> {
        Self::fft_shift(&Self::bin_frequencies(size, sample_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_fft_single_tone() {
        let n = 128;
        let sample_rate = 128.0;
        let freq = 10.0;

        let mut signal: Vec<Complex64> = (0..n)
            .map(|i| {
                let phase = 2.0 * PI * freq * i as f64 / sample_rate;
                Complex64::new(phase.cos(), phase.sin())
            })
            .collect();

        let mut processor = FftProcessor::new(n);
        processor.fft_inplace(&mut signal);

        let peak_bin = signal
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm().partial_cmp(&b.1.norm()).unwrap())
            .unwrap()
            .0;
        assert_eq!(peak_bin, 10);
    }

    #[test]
    fn test_shift_even_length() {
        let shifted = FftProcessor::fft_shift(&[0, 1, 2, 3, -4, -3, -2, -1]);
        assert_eq!(shifted, vec![-4, -3, -2, -1, 0, 1, 2, 3]);
    }

    #[test]
    fn test_shift_odd_length_puts_dc_at_center() {
        let shifted = FftProcessor::fft_shift(&[0, 1, 2, -2, -1]);
        assert_eq!(shifted, vec![-2, -1, 0, 1, 2]);
        assert_eq!(shifted[5 / 2], 0);
    }

    #[test]
    fn test_bin_frequencies_even() {
        let freqs = FftProcessor::bin_frequencies(8, 8.0);
        assert_eq!(freqs, vec![0.0, 1.0, 2.0, 3.0, -4.0, -3.0, -2.0, -1.0]);
    }

    #[test]
    fn test_bin_frequencies_odd() {
        let freqs = FftProcessor::bin_frequencies(5, 10.0);
        assert_eq!(freqs, vec![0.0, 2.0, 4.0, -4.0, -2.0]);
    }

    #[test]
    fn test_shifted_frequencies_monotonic() {
        let freqs = FftProcessor::shifted_frequencies(4096, 2e6);
        assert_relative_eq!(freqs[2048], 0.0);
        assert_relative_eq!(freqs[0], -1e6);
        assert!(freqs.windows(2).all(|w| w[0] < w[1]));
    }
}
