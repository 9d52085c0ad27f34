//! Capture Controller
//!
//! Drives repeated reads from an RX stream into a fixed-size
//! [`SampleBuffer`] until it is full or the stream fails.
//!
//! ## Read loop
//!
//! ```text
//!            ┌──────────── read(min(chunk_limit, remaining), timeout) ◄──┐
//!            │                                                           │
//!   Ok(n>0) ─┼─► append n samples ──────────── remaining > 0 ────────────┤
//!   Timeout ─┼─► warn, count, retry (optionally capped) ─────────────────┘
//!   other   ─┴─► abort, keep what was captured
//! ```
//!
//! A timeout never advances the fill cursor. With the default
//! [`CaptureConfig`] timeouts are retried indefinitely; `max_timeouts` and
//! `deadline` bound that.
//!
//! The stream is started on entry and stopped and closed exactly once on
//! every way out of [`capture`], including unwinding.

use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};

use sdrprobe_core::buffer::SampleBuffer;
use sdrprobe_core::types::IQSample;

use crate::device::{SdrError, SdrResult};
use crate::hal::StreamHandle;

/// Largest read requested from the driver.
pub const DEFAULT_CHUNK_LIMIT: usize = 4096;

/// Per-read timeout.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Capture loop parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Samples requested
    pub total_samples: usize,
    /// Largest single read
    pub chunk_limit: usize,
    /// Timeout of each read
    pub timeout: Duration,
    /// Timeouts tolerated before giving up; `None` retries forever
    pub max_timeouts: Option<usize>,
    /// Wall-clock budget for the whole capture
    pub deadline: Option<Duration>,
}

impl CaptureConfig {
    pub fn new(total_samples: usize) -> Self {
        Self {
            total_samples,
            chunk_limit: DEFAULT_CHUNK_LIMIT,
            timeout: DEFAULT_READ_TIMEOUT,
            max_timeouts: None,
            deadline: None,
        }
    }

    pub fn with_max_timeouts(mut self, max_timeouts: usize) -> Self {
        self.max_timeouts = Some(max_timeouts);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// How the capture loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// Buffer filled
    Complete,
    /// Stream failed after delivering some samples
    Partial,
    /// Timeout cap or deadline exhausted
    TimedOut,
    /// Stream failed before delivering anything
    StreamError,
}

/// Outcome of one capture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureResult {
    /// Samples received
    pub filled: usize,
    /// Samples requested
    pub requested: usize,
    pub status: CaptureStatus,
    /// Read timeouts seen
    pub timeouts: usize,
    /// Error that ended the loop
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<SdrError>,
}

fn serialize_error<S: Serializer>(error: &Option<SdrError>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(e) => s.serialize_some(&e.to_string()),
        None => s.serialize_none(),
    }
}

impl CaptureResult {
    pub fn is_complete(&self) -> bool {
        self.status == CaptureStatus::Complete
    }
}

/// Captured samples and the loop outcome.
#[derive(Debug)]
pub struct Capture {
    pub buffer: SampleBuffer,
    pub result: CaptureResult,
}

/// Stops and closes the stream when dropped.
struct StreamGuard<'a> {
    stream: &'a mut dyn StreamHandle,
    released: bool,
}

impl<'a> StreamGuard<'a> {
    fn new(stream: &'a mut dyn StreamHandle) -> Self {
        Self {
            stream,
            released: false,
        }
    }

    /// Stop then close, reporting the first failure.
    fn release(&mut self) -> SdrResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let stopped = self.stream.stop();
        let closed = self.stream.close();
        stopped.and(closed)
    }
}

impl Drop for StreamGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("Stream release failed: {}", e);
        }
    }
}

/// Fill a buffer of `config.total_samples` from `stream`.
///
/// Fails only when the stream cannot be started or released; read failures
/// are reported through [`CaptureResult`] alongside the samples gathered
/// before them.
pub fn capture(stream: &mut dyn StreamHandle, config: &CaptureConfig) -> SdrResult<Capture> {
    let requested = config.total_samples;
    let chunk_limit = config.chunk_limit.max(1);

    let mut guard = StreamGuard::new(stream);
    guard.stream.start()?;

    tracing::info!(
        samples = requested,
        chunk = chunk_limit,
        "Capturing {} samples",
        requested
    );

    let started = Instant::now();
    let mut buffer = SampleBuffer::new(requested);
    let mut chunk = vec![IQSample::new(0.0, 0.0); chunk_limit.min(requested).max(1)];
    let mut timeouts = 0usize;
    let mut error = None;
    let mut timed_out = false;

    while !buffer.is_full() {
        if let Some(deadline) = config.deadline {
            if started.elapsed() >= deadline {
                tracing::warn!(
                    filled = buffer.filled(),
                    "Capture deadline of {:?} exhausted",
                    deadline
                );
                timed_out = true;
                break;
            }
        }

        let want = chunk_limit.min(buffer.remaining());
        match guard.stream.read(&mut chunk[..want], config.timeout) {
            Ok(0) => {
                let e = SdrError::Stream {
                    code: 0,
                    message: "read returned no samples".to_string(),
                };
                tracing::error!("Stream error: {}", e);
                error = Some(e);
                break;
            }
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n.min(want)]);
            }
            Err(SdrError::Timeout) => {
                timeouts += 1;
                tracing::warn!("Stream timeout, retrying...");
                if config.max_timeouts.is_some_and(|max| timeouts > max) {
                    tracing::warn!(timeouts, "Giving up after repeated timeouts");
                    timed_out = true;
                    break;
                }
            }
            Err(e) => {
                tracing::error!("Stream error: {}", e);
                error = Some(e);
                break;
            }
        }
    }

    guard.release()?;

    let filled = buffer.filled();
    let status = if buffer.is_full() {
        CaptureStatus::Complete
    } else if timed_out {
        CaptureStatus::TimedOut
    } else if filled == 0 {
        CaptureStatus::StreamError
    } else {
        CaptureStatus::Partial
    };

    tracing::info!(
        filled,
        requested,
        timeouts,
        status = ?status,
        "Captured {}/{} samples",
        filled,
        requested
    );

    Ok(Capture {
        buffer,
        result: CaptureResult {
            filled,
            requested,
            status,
            timeouts,
            error,
        },
    })
}
