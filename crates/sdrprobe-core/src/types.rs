//! Core types for SDR validation
//!
//! This module defines the fundamental types shared by the capture, integrity
//! and analysis stages, in particular the complex I/Q sample representation.
//!
//! ## Understanding I/Q Samples
//!
//! A receiver delivers complex baseband samples:
//! - **I (In-phase)**: the real component, aligned with the local oscillator
//! - **Q (Quadrature)**: the imaginary component, 90° out of phase
//!
//! Drivers hand out 32-bit float pairs (`CF32`); the pipeline widens them to
//! `f64` so the FFT accumulation does not lose precision over many segments.
//!
//! ```text
//!            Q (Imaginary)
//!            ^
//!            |     * (I=0.7, Q=0.7)
//!            |    /
//!            |   / magnitude = 1.0
//!            |  /  phase = 45°
//!            | /
//!   ---------+---------> I (Real)
//!            |
//! ```

use num_complex::Complex64;
use std::f64::consts::PI;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single I/Q sample point
pub type IQSample = Complex64;

/// Small additive floor used before every dB conversion.
pub const DB_EPSILON: f64 = 1e-10;

/// Result type for DSP operations
pub type DspResult<T> = Result<T, DspError>;

/// Precondition failures of the spectral estimator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DspError {
    #[error("Cannot estimate a spectrum from an empty capture")]
    EmptyCapture,

    #[error("Buffer too short: expected {expected}, got {actual}")]
    BufferTooShort { expected: usize, actual: usize },

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),
}

/// Convert a linear power value to decibels.
///
/// The [`DB_EPSILON`] floor keeps the result finite for zero power.
#[inline]
pub fn power_to_db(power: f64) -> f64 {
    10.0 * (power + DB_EPSILON).log10()
}

/// Helper functions for working with complex samples
pub mod complex_ops {
    use super::*;

    /// Compute the power (magnitude squared) of a complex number
    #[inline]
    pub fn power(c: Complex) -> f64 {
        c.norm_sqr()
    }

    /// Compute the average power of a signal
    pub fn average_power(samples: &[IQSample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|s| power(*s)).sum::<f64>() / samples.len() as f64
    }

    /// Generate a complex exponential (cisoid) at given frequency
    ///
    /// Returns e^(j*2*π*f*t) where t = sample_idx / sample_rate
    #[inline]
    pub fn cis(frequency: f64, sample_idx: usize, sample_rate: f64) -> Complex {
        let t = sample_idx as f64 / sample_rate;
        let phase = 2.0 * PI * frequency * t;
        Complex::new(phase.cos(), phase.sin())
    }

    /// Widen an interleaved `CF32` pair to an [`IQSample`]
    #[inline]
    pub fn from_cf32(pair: [f32; 2]) -> IQSample {
        IQSample::new(pair[0] as f64, pair[1] as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_power_to_db_zero_is_finite() {
        let db = power_to_db(0.0);
        assert!(db.is_finite());
        assert_relative_eq!(db, -100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_power_to_db_monotonic() {
        let powers = [0.0, 1e-12, 1e-9, 1e-3, 0.5, 1.0, 10.0, 1e6];
        for pair in powers.windows(2) {
            assert!(
                power_to_db(pair[0]) < power_to_db(pair[1]),
                "{} dB should be below {} dB",
                power_to_db(pair[0]),
                power_to_db(pair[1])
            );
        }
    }

    #[test]
    fn test_average_power() {
        let samples = vec![
            Complex::new(1.0, 0.0),
            Complex::new(0.0, 1.0),
            Complex::new(-1.0, 0.0),
            Complex::new(0.0, -1.0),
        ];
        assert_relative_eq!(complex_ops::average_power(&samples), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_cis_quarter_turn() {
        let c = complex_ops::cis(1.0, 1, 4.0);
        assert_relative_eq!(c.re, 0.0, epsilon = 1e-12);
        assert_relative_eq!(c.im, 1.0, epsilon = 1e-12);
    }
}
