//! The end-to-end analysis pipeline.
//!
//! Wires the shared sample history, the spectral engine, the temporal
//! averager, the log-frequency spectrogram, and the health monitor into a
//! producer/consumer pair: the audio callback feeds an [`AudioIngress`]
//! handle, and a fixed-rate tick drives [`AnalysisPipeline::tick`]. The two
//! sides only meet at the ring buffer and the timing window, each behind a
//! short mutex section; everything else is tick-exclusive state.

use crate::averaging::MovingAverage;
use crate::health::{CallbackTimings, SampleCounts, SignalHealthMonitor};
use crate::sample_buffer::SampleHistory;
use crate::smoothing::{KernelSmoother, SmoothingKernel};
use crate::spectrogram::{
    amplitude_to_dbfs, generate_log_axis, quantize_dbfs, CubicInterpolator, SpectrogramHistory,
};
use crate::spectrum::{bin_frequencies, SpectralEngine};
use crate::{CoreError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Configuration for the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Sample rate reported by the audio backend
    pub sample_rate: u32,
    /// FFT size (power of two)
    pub fft_size: usize,
    /// Number of magnitude frames in the temporal moving average
    pub average_count: usize,
    /// Decibel floor of the dBFS scale
    pub db_floor: f32,
    /// Spectrogram width in log-frequency bins (texture row width)
    pub spectrogram_columns: usize,
    /// Spectrogram history depth in rows
    pub spectrogram_rows: usize,
    /// Lower bound of the displayed frequency axis
    pub min_frequency: f32,
    /// Upper bound of the displayed frequency axis
    pub max_frequency: f32,
    /// Number of past audio blocks in the health monitor's rolling sums
    pub health_sampling_periods: usize,
    /// Number of past callbacks in the timing window
    pub timing_window: usize,
    /// Width of the RTA kernel smoother (1 disables it)
    pub rta_smoothing_width: usize,
    /// Kernel used by the RTA smoother
    pub rta_smoothing_kernel: SmoothingKernel,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 16384,
            average_count: 10,
            db_floor: -96.0,
            spectrogram_columns: 1024,
            spectrogram_rows: 256,
            min_frequency: 20.0,
            max_frequency: 20000.0,
            health_sampling_periods: 1,
            timing_window: 100,
            rta_smoothing_width: 1,
            rta_smoothing_kernel: SmoothingKernel::Rectangular,
        }
    }
}

impl AnalysisConfig {
    fn validate(&self) -> Result<()> {
        if self.average_count == 0 {
            return Err(CoreError::InvalidConfig(
                "average count must be at least 1".into(),
            ));
        }
        if self.spectrogram_columns == 0 || self.spectrogram_rows == 0 {
            return Err(CoreError::InvalidConfig(
                "spectrogram dimensions must be non-zero".into(),
            ));
        }
        if !(self.min_frequency > 0.0) || self.max_frequency <= self.min_frequency {
            return Err(CoreError::InvalidConfig(format!(
                "invalid frequency bounds {}..{}",
                self.min_frequency, self.max_frequency
            )));
        }
        if !(self.db_floor < 0.0) {
            return Err(CoreError::InvalidConfig(
                "decibel floor must be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Health counters surfaced to the diagnostic display.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthReport {
    /// Rolling totals of degenerate samples
    pub samples: SampleCounts,
    /// Total stream over/underruns since startup
    pub xruns: u64,
    /// Mean audio callback execution time in milliseconds
    pub mean_callback_ms: f32,
}

/// One analysis result, produced per tick once enough samples are buffered.
#[derive(Debug, Clone, Default)]
pub struct AnalysisSnapshot {
    /// Averaged per-bin magnitudes in linear amplitude (the RTA curve)
    pub rta_amplitudes: Vec<f32>,
    /// Linear frequency of each RTA bin
    pub bin_frequencies: Arc<Vec<f32>>,
    /// Health counters and callback timing
    pub health: HealthReport,
    /// Monotonic count of analyses produced
    pub tick: u64,
}

/// Counters describing pipeline throughput.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineStats {
    /// Total samples received from the audio callback
    pub samples_ingested: u64,
    /// Ticks that produced an analysis
    pub ticks_analyzed: u64,
    /// Ticks skipped because fewer than `fft_size` samples were buffered
    pub ticks_skipped: u64,
    /// Ring buffer fill ratio in `[0, 1]`
    pub buffer_fill: f32,
}

/// Cheap cloneable producer-side handle for the audio callback.
///
/// `push_block` copies one block into the shared history and records how
/// long the copy took. The critical path holds one short lock and performs
/// no allocation beyond the ring's own writes.
#[derive(Clone)]
pub struct AudioIngress {
    history: Arc<SampleHistory>,
    timings: Arc<CallbackTimings>,
    xruns: Arc<AtomicU64>,
    samples_ingested: Arc<AtomicU64>,
}

impl AudioIngress {
    /// Feed one callback block of mono samples.
    pub fn push_block(&self, samples: &[f32]) {
        let start = Instant::now();
        self.history.push_block(samples);
        self.timings.record(start.elapsed());
        self.samples_ingested
            .fetch_add(samples.len() as u64, Ordering::Relaxed);
    }

    /// Record a stream over/underrun reported by the backend.
    pub fn record_xrun(&self) {
        self.xruns.fetch_add(1, Ordering::Relaxed);
    }
}

/// Producer/consumer spectrum analysis pipeline.
pub struct AnalysisPipeline {
    config: AnalysisConfig,

    // Shared with the audio callback
    history: Arc<SampleHistory>,
    timings: Arc<CallbackTimings>,
    xruns: Arc<AtomicU64>,
    samples_ingested: Arc<AtomicU64>,

    // Tick-exclusive analysis state
    engine: SpectralEngine,
    averager: MovingAverage,
    smoother: KernelSmoother,
    monitor: SignalHealthMonitor,
    linear_frequencies: Arc<Vec<f32>>,
    log_frequencies: Vec<f32>,
    spectrogram: SpectrogramHistory,

    snapshot_sender: Sender<AnalysisSnapshot>,
    snapshot_receiver: Receiver<AnalysisSnapshot>,
    latest: AnalysisSnapshot,

    ticks_analyzed: u64,
    ticks_skipped: u64,
}

impl AnalysisPipeline {
    /// Build the pipeline. Failure here (bad FFT size, bad axis bounds) is
    /// fatal to analysis and is surfaced to the orchestration layer.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        let engine = SpectralEngine::new(config.fft_size)?;
        let averager = MovingAverage::new(config.average_count, engine.num_bins());
        let monitor = SignalHealthMonitor::new(config.health_sampling_periods);
        let linear_frequencies =
            Arc::new(bin_frequencies(config.sample_rate, config.fft_size));
        let log_frequencies = generate_log_axis(
            config.min_frequency,
            config.max_frequency,
            config.spectrogram_columns,
        );
        let spectrogram =
            SpectrogramHistory::new(config.spectrogram_columns, config.spectrogram_rows);

        let (snapshot_sender, snapshot_receiver) = bounded(16);

        debug!(
            "analysis pipeline created: sample_rate={}, fft_size={}, bins={}, spectrogram={}x{}",
            config.sample_rate,
            config.fft_size,
            engine.num_bins(),
            config.spectrogram_columns,
            config.spectrogram_rows
        );

        Ok(Self {
            history: Arc::new(SampleHistory::new(config.fft_size)),
            timings: Arc::new(CallbackTimings::new(config.timing_window)),
            xruns: Arc::new(AtomicU64::new(0)),
            samples_ingested: Arc::new(AtomicU64::new(0)),
            engine,
            averager,
            smoother: KernelSmoother::new(),
            monitor,
            linear_frequencies,
            log_frequencies,
            spectrogram,
            snapshot_sender,
            snapshot_receiver,
            latest: AnalysisSnapshot::default(),
            ticks_analyzed: 0,
            ticks_skipped: 0,
            config,
        })
    }

    /// Handle for the audio callback thread.
    pub fn ingress(&self) -> AudioIngress {
        AudioIngress {
            history: Arc::clone(&self.history),
            timings: Arc::clone(&self.timings),
            xruns: Arc::clone(&self.xruns),
            samples_ingested: Arc::clone(&self.samples_ingested),
        }
    }

    /// Run one analysis tick.
    ///
    /// Returns `None` (not an error) while fewer than `fft_size` samples
    /// are buffered. Otherwise: snapshot, FFT, temporal averaging, optional
    /// kernel smoothing, log-frequency resampling into the spectrogram,
    /// and health aggregation.
    pub fn tick(&mut self) -> Option<AnalysisSnapshot> {
        let Some(samples) = self.history.snapshot(self.config.fft_size) else {
            self.ticks_skipped += 1;
            trace!(
                "analysis tick skipped: {} of {} samples buffered",
                self.history.len(),
                self.config.fft_size
            );
            return None;
        };

        let magnitudes = self.engine.process(&samples);
        self.averager.add_frame(magnitudes);

        let mut rta = self.averager.average();
        if self.config.rta_smoothing_width > 1 {
            rta = self.smoother.process(
                &rta,
                self.config.rta_smoothing_kernel,
                self.config.rta_smoothing_width,
            );
        }

        self.push_spectrogram_row(&rta);
        let health = self.aggregate_health();

        self.ticks_analyzed += 1;
        let snapshot = AnalysisSnapshot {
            rta_amplitudes: rta,
            bin_frequencies: Arc::clone(&self.linear_frequencies),
            health,
            tick: self.ticks_analyzed,
        };

        self.latest = snapshot.clone();
        let _ = self.snapshot_sender.try_send(snapshot.clone());
        Some(snapshot)
    }

    fn push_spectrogram_row(&mut self, amplitudes: &[f32]) {
        // Bin 0 sits at 0 Hz, which has no position on a log axis; fit the
        // interpolant from bin 1 upward.
        let spline =
            CubicInterpolator::fit(&self.linear_frequencies[1..], &amplitudes[1..]);
        let floor = self.config.db_floor;
        let row: Vec<u8> = self
            .log_frequencies
            .iter()
            .map(|&freq| {
                let db = amplitude_to_dbfs(spline.evaluate(freq), floor);
                quantize_dbfs(db, floor)
            })
            .collect();
        self.spectrogram.push_row(row);
    }

    fn aggregate_health(&mut self) -> HealthReport {
        let block = self.history.latest_block();
        let samples = self.monitor.analyse(&block);
        HealthReport {
            samples,
            xruns: self.xruns.load(Ordering::Relaxed),
            mean_callback_ms: self.timings.mean_millis(),
        }
    }

    /// Most recent analysis snapshot (default-initialized before the first
    /// successful tick).
    pub fn latest(&self) -> AnalysisSnapshot {
        self.latest.clone()
    }

    /// Receive a snapshot from the handoff channel, if one is queued.
    pub fn try_receive(&self) -> Option<AnalysisSnapshot> {
        self.snapshot_receiver.try_recv().ok()
    }

    /// The scrolling spectrogram history.
    pub fn spectrogram(&self) -> &SpectrogramHistory {
        &self.spectrogram
    }

    /// The log-spaced frequency axis backing the spectrogram columns.
    pub fn log_frequencies(&self) -> &[f32] {
        &self.log_frequencies
    }

    /// The linear frequency axis backing the RTA bins.
    pub fn linear_frequencies(&self) -> &[f32] {
        &self.linear_frequencies
    }

    /// Current configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Throughput counters.
    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            samples_ingested: self.samples_ingested.load(Ordering::Relaxed),
            ticks_analyzed: self.ticks_analyzed,
            ticks_skipped: self.ticks_skipped,
            buffer_fill: self.history.len() as f32 / self.config.fft_size as f32,
        }
    }

    /// Change the temporal averaging depth. Existing history is kept; the
    /// effective window shrinks or grows from here on.
    pub fn set_average_count(&mut self, average_count: usize) {
        let average_count = average_count.max(1);
        self.config.average_count = average_count;
        self.averager.set_depth(average_count);
        debug!("average count set to {average_count}");
    }

    /// Change the spectrogram resolution and history depth. A change of
    /// either dimension clears the history and regenerates the log axis.
    pub fn set_spectrogram_size(&mut self, columns: usize, rows: usize) {
        if columns == 0 || rows == 0 {
            return;
        }
        if columns != self.config.spectrogram_columns {
            self.log_frequencies = generate_log_axis(
                self.config.min_frequency,
                self.config.max_frequency,
                columns,
            );
        }
        self.spectrogram.reconfigure(columns, rows);
        self.config.spectrogram_columns = columns;
        self.config.spectrogram_rows = rows;
        debug!("spectrogram resized to {columns}x{rows}");
    }

    /// Adopt a new sample rate, regenerating the linear frequency axis. The
    /// buffered samples and averaging history carry over.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == self.config.sample_rate {
            return;
        }
        self.config.sample_rate = sample_rate;
        self.linear_frequencies =
            Arc::new(bin_frequencies(sample_rate, self.config.fft_size));
        debug!("sample rate set to {sample_rate} Hz");
    }

    /// Adopt a new FFT size: re-plans the transform, resizes the ring
    /// buffer, and resets the averaging history. In-flight analysis state
    /// is discarded; this is a documented reset, not an error.
    pub fn set_fft_size(&mut self, fft_size: usize) -> Result<()> {
        if fft_size == self.config.fft_size {
            return Ok(());
        }
        self.engine.set_fft_size(fft_size)?;
        self.config.fft_size = fft_size;
        self.history.set_capacity(fft_size);
        self.averager
            .configure(self.config.average_count, self.engine.num_bins());
        self.linear_frequencies =
            Arc::new(bin_frequencies(self.config.sample_rate, fft_size));
        debug!("FFT size set to {fft_size}");
        Ok(())
    }
}
