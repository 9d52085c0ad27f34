//! Capture integrity checks
//!
//! A capture is rejected before any spectral work when the device delivered
//! less than half of the requested samples, or when everything it delivered is
//! exactly zero (a dead front-end or a stream that never carried data).

use crate::types::IQSample;

/// Why a capture was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityError {
    #[error("Insufficient samples captured: {read}/{requested}")]
    InsufficientSamples { read: usize, requested: usize },

    #[error("Captured data is all zeros (hardware issue)")]
    AllZeroSignal,
}

/// Validate a capture of `read` samples out of `requested`.
///
/// Rules are applied in order: the fill threshold first, then the all-zero
/// test over `buffer[..read]`.
pub fn check(read: usize, requested: usize, buffer: &[IQSample]) -> Result<(), IntegrityError> {
    if read < requested / 2 {
        return Err(IntegrityError::InsufficientSamples { read, requested });
    }

    let zero = IQSample::new(0.0, 0.0);
    let valid = &buffer[..read.min(buffer.len())];
    if valid.iter().all(|s| *s == zero) {
        return Err(IntegrityError::AllZeroSignal);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SampleBuffer;

    const N: usize = 1024;

    #[test]
    fn test_insufficient_below_half() {
        let buffer = vec![IQSample::new(1.0, 0.0); N];
        let err = check(N / 2 - 1, N, &buffer).unwrap_err();
        assert_eq!(
            err,
            IntegrityError::InsufficientSamples {
                read: N / 2 - 1,
                requested: N
            }
        );
    }

    #[test]
    fn test_exactly_half_is_enough() {
        let buffer = vec![IQSample::new(0.0, 1.0); N];
        assert!(check(N / 2, N, &buffer).is_ok());
    }

    #[test]
    fn test_all_zero_rejected() {
        let buffer = vec![IQSample::new(0.0, 0.0); N];
        assert_eq!(check(N, N, &buffer), Err(IntegrityError::AllZeroSignal));
    }

    #[test]
    fn test_single_nonzero_passes() {
        let mut buffer = vec![IQSample::new(0.0, 0.0); N];
        buffer[N - 1] = IQSample::new(0.0, 1e-6);
        assert!(check(N, N, &buffer).is_ok());
    }

    #[test]
    fn test_nonzero_outside_valid_prefix_is_ignored() {
        let mut buffer = vec![IQSample::new(0.0, 0.0); N];
        buffer[N - 1] = IQSample::new(1.0, 0.0);
        assert_eq!(check(N - 1, N, &buffer), Err(IntegrityError::AllZeroSignal));
    }

    #[test]
    fn test_insufficient_checked_before_zero() {
        let buffer = vec![IQSample::new(0.0, 0.0); N];
        assert!(matches!(
            check(0, N, &buffer),
            Err(IntegrityError::InsufficientSamples { read: 0, .. })
        ));
    }

    #[test]
    fn test_buffer_method_matches_free_function() {
        let mut buffer = SampleBuffer::new(N);
        buffer.extend_from_slice(&vec![IQSample::new(0.25, 0.0); N]);
        assert!(buffer.check_integrity().is_ok());

        let empty = SampleBuffer::new(N);
        assert!(empty.check_integrity().is_err());
    }
}
