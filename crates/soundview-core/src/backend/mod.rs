//! Audio capture backends feeding the analysis pipeline.
//!
//! # Features
//!
//! - `audio` (default): capture from the system input device via `cpal`.
//! - `mock-audio`: a synthetic sine-wave source for machines without audio
//!   hardware.

#[cfg(feature = "audio")]
pub mod cpal_backend;
#[cfg(feature = "mock-audio")]
pub mod mock_backend;

use crate::Result;

/// Description of a configured capture stream.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Device name as reported by the host
    pub device_name: String,
    /// Stream sample rate in Hz
    pub sample_rate: u32,
    /// Channel count of the underlying stream (only channel 0 is analyzed)
    pub channels: u16,
}

/// A source of raw audio blocks for the pipeline.
///
/// Implementations deliver mono sample blocks to the
/// [`AudioIngress`](crate::pipeline::AudioIngress) handle they were
/// constructed with, and report stream over/underruns through the same
/// handle.
pub trait AudioBackend {
    /// Start delivering blocks.
    fn start(&mut self) -> Result<()>;

    /// Stop the stream. Dropping the backend also stops it.
    fn stop(&mut self);

    /// Information about the configured stream.
    fn info(&self) -> &StreamInfo;
}
