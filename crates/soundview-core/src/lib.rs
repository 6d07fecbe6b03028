//! SoundView Core - Real-Time Spectrum Analysis Pipeline
//!
//! This crate contains the analysis core for SoundView, including:
//! - Sample ring buffer shared with the audio callback
//! - Windowed FFT spectral engine
//! - Temporal moving averager and spectral kernel smoother
//! - Log-frequency resampler and scrolling spectrogram history
//! - Signal health and callback performance monitoring
//!
//! Rendering frontends consume the pipeline outputs (RTA curve, spectrogram
//! texture bytes, health counters) through read-only getters; nothing in
//! this crate draws.

#![warn(missing_docs)]

use thiserror::Error;

pub mod averaging;
pub mod backend;
pub mod health;
pub mod logging;
pub mod pipeline;
pub mod sample_buffer;
pub mod smoothing;
pub mod spectrogram;
pub mod spectrum;

// --- Re-exports grouped by category ---

// Analysis pipeline
pub use pipeline::{
    AnalysisConfig, AnalysisPipeline, AnalysisSnapshot, AudioIngress, HealthReport, PipelineStats,
};

// Spectral processing
pub use averaging::MovingAverage;
pub use smoothing::{KernelSmoother, SmoothingKernel};
pub use spectrum::{bin_frequencies, hann_window, SpectralEngine};

// Display bridging
pub use spectrogram::{
    amplitude_to_dbfs, dbfs_to_y_proportion, frequency_to_x_proportion, generate_log_axis,
    quantize_dbfs, CubicInterpolator, SpectrogramHistory,
};

// Capture & health
pub use health::{CallbackTimings, SampleCounts, SignalHealthMonitor};
pub use sample_buffer::SampleHistory;

// Logging
pub use logging::LogConfig;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid analysis configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Audio backend failure
    #[error("Audio backend error: {0}")]
    Backend(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
