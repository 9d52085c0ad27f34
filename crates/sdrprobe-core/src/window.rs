//! Window functions for spectral estimation
//!
//! Two tapers are needed: a symmetric Hann for the averaged power spectrum and
//! a periodic Tukey for the spectrogram segments.
//!
//! ```text
//! Hann (symmetric)         Tukey α=0.25 (periodic)
//!       ____                 ______________
//!     /      \              /              \
//!    /        \            /                \
//! __/          \__      __/                  \
//! ```

use std::f64::consts::PI;

/// Supported analysis windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Window {
    /// Symmetric Hann: `0.5 - 0.5 cos(2πi/(L-1))`
    Hann,
    /// Periodic Tukey with taper fraction `alpha`
    Tukey { alpha: f64 },
}

impl Window {
    /// Generate `len` coefficients.
    pub fn coefficients(&self, len: usize) -> Vec<f64> {
        match *self {
            Window::Hann => hann(len),
            Window::Tukey { alpha } => tukey_periodic(len, alpha),
        }
    }
}

/// Symmetric Hann window. A length-1 window is `[1.0]`.
pub fn hann(len: usize) -> Vec<f64> {
    match len {
        0 => Vec::new(),
        1 => vec![1.0],
        _ => {
            let denom = (len - 1) as f64;
            (0..len)
                .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / denom).cos())
                .collect()
        }
    }
}

/// Symmetric Tukey window of length `len`.
///
/// `alpha <= 0` degenerates to rectangular, `alpha >= 1` to Hann.
pub fn tukey(len: usize, alpha: f64) -> Vec<f64> {
    if len == 0 {
        return Vec::new();
    }
    if len == 1 {
        return vec![1.0];
    }
    if alpha <= 0.0 {
        return vec![1.0; len];
    }
    if alpha >= 1.0 {
        return hann(len);
    }

    let m = (len - 1) as f64;
    let width = (alpha * m / 2.0).floor() as usize;

    (0..len)
        .map(|i| {
            let n = i as f64;
            if i <= width {
                0.5 * (1.0 + (PI * (-1.0 + 2.0 * n / (alpha * m))).cos())
            } else if i < len - 1 - width {
                1.0
            } else {
                0.5 * (1.0 + (PI * (-2.0 / alpha + 1.0 + 2.0 * n / (alpha * m))).cos())
            }
        })
        .collect()
}

/// Periodic Tukey window: the symmetric window of `len + 1` with its last
/// point dropped, the form used for DFT-even segment analysis.
pub fn tukey_periodic(len: usize, alpha: f64) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len];
    }
    let mut w = tukey(len + 1, alpha);
    w.truncate(len);
    w
}

/// Sum of squared coefficients (used for density scaling).
pub fn power_sum(window: &[f64]) -> f64 {
    window.iter().map(|w| w * w).sum()
}
