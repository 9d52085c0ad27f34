//! Fixed-capacity capture buffer
//!
//! The buffer is allocated once per run at the requested size, filled
//! incrementally by the capture loop and then moved on to analysis. Only the
//! prefix `[0, filled)` holds received samples; the tail stays zeroed.

use crate::integrity::{self, IntegrityError};
use crate::types::IQSample;

/// Fixed-size I/Q sample buffer with a fill cursor.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    samples: Vec<IQSample>,
    filled: usize,
}

impl SampleBuffer {
    /// Allocate a zeroed buffer for `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![IQSample::new(0.0, 0.0); capacity],
            filled: 0,
        }
    }

    /// Requested sample count.
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Number of valid samples.
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Samples still missing.
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.filled
    }

    pub fn is_full(&self) -> bool {
        self.filled == self.samples.len()
    }

    /// Copy `chunk` in at the fill cursor.
    ///
    /// Anything beyond the remaining capacity is dropped; returns the number of
    /// samples actually stored.
    pub fn extend_from_slice(&mut self, chunk: &[IQSample]) -> usize {
        let n = chunk.len().min(self.remaining());
        self.samples[self.filled..self.filled + n].copy_from_slice(&chunk[..n]);
        self.filled += n;
        n
    }

    /// The valid prefix.
    pub fn valid(&self) -> &[IQSample] {
        &self.samples[..self.filled]
    }

    /// Run the integrity rules against this buffer.
    pub fn check_integrity(&self) -> Result<(), IntegrityError> {
        integrity::check(self.filled, self.capacity(), &self.samples)
    }

    /// Consume the buffer, keeping only the valid prefix.
    pub fn into_valid(mut self) -> Vec<IQSample> {
        self.samples.truncate(self.filled);
        self.samples
    }
}
