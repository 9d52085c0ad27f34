//! # sdrprobe core
//!
//! Sample handling and spectral estimation for validating a software-defined
//! radio receiver.
//!
//! ## Overview
//!
//! A validation run captures a block of complex baseband samples, rejects
//! degenerate captures, and summarises the rest as a power spectrum and a
//! spectrogram. This crate holds everything downstream of the device:
//!
//! - **Sample buffer**: fixed-capacity capture buffer with a fill cursor
//! - **Integrity**: minimum fill and all-zero detection
//! - **FFT utilities and windows**: planned FFTs, bin frequencies, Hann and Tukey
//! - **Analysis**: Welch spectrum, summary statistics, STFT spectrogram
//! - **Observability**: `tracing` subscriber setup
//!
//! ## Signal Flow
//!
//! ```text
//! SampleBuffer → integrity::check → analysis::estimate → { spectrum, summary, spectrogram }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use sdrprobe_core::buffer::SampleBuffer;
//! use sdrprobe_core::types::complex_ops::cis;
//! use sdrprobe_core::analysis;
//!
//! let tone: Vec<_> = (0..8192).map(|i| cis(100e3, i, 2e6)).collect();
//! let mut buffer = SampleBuffer::new(8192);
//! buffer.extend_from_slice(&tone);
//! buffer.check_integrity().unwrap();
//!
//! let filled = buffer.filled();
//! let est = analysis::estimate(buffer.valid(), filled, 2e6, 915e6).unwrap();
//! println!("noise floor {:.1} dB", est.summary.noise_floor_db);
//! ```

pub mod analysis;
pub mod buffer;
pub mod fft_utils;
pub mod integrity;
pub mod observe;
pub mod types;
pub mod window;

pub use analysis::{estimate, PowerSpectrum, SpectralEstimate, Spectrogram, SummaryStats};
pub use buffer::SampleBuffer;
pub use integrity::IntegrityError;
pub use types::{Complex, DspError, DspResult, IQSample};
