//! SoundView - real-time audio spectrum analyzer.
//!
//! Headless orchestration binary: captures the default input device, runs
//! the analysis pipeline at a fixed 30 Hz tick, and periodically logs the
//! spectrum peak, signal health, and throughput. Rendering frontends
//! consume the same pipeline outputs through `soundview-core`.

#![warn(missing_docs)]

mod logging_setup;

use anyhow::{Context, Result};
use soundview_core::backend::AudioBackend;
use soundview_core::{amplitude_to_dbfs, AnalysisConfig, AnalysisPipeline, AnalysisSnapshot, LogConfig};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const TICK_RATE_HZ: u32 = 30;

/// Log a diagnostic report once per this many analyses (once a second at
/// the 30 Hz tick rate).
const REPORT_EVERY_TICKS: u64 = 30;

fn main() -> Result<()> {
    let _log_guard = logging_setup::init(&LogConfig::default())?;

    info!("=== SoundView session started ===");

    let config = AnalysisConfig::default();
    let mut pipeline =
        AnalysisPipeline::new(config.clone()).context("failed to initialize analysis pipeline")?;

    let mut backend = create_backend(&pipeline, &config)?;
    backend.start().context("failed to start audio capture")?;

    let stream = backend.info();
    info!(
        "capturing from '{}' ({} ch @ {} Hz)",
        stream.device_name, stream.channels, stream.sample_rate
    );

    // The device may have refused the preferred rate; the frequency axes
    // follow whatever the stream actually delivers.
    if stream.sample_rate != config.sample_rate {
        let rate = stream.sample_rate;
        pipeline.set_sample_rate(rate);
        info!("frequency axes regenerated for {rate} Hz");
    }

    run_analysis_loop(&mut pipeline)
}

#[cfg(feature = "mock-audio")]
fn create_backend(
    pipeline: &AnalysisPipeline,
    config: &AnalysisConfig,
) -> Result<Box<dyn AudioBackend>> {
    use soundview_core::backend::mock_backend::MockBackend;
    info!("using mock audio backend (440 Hz sine)");
    Ok(Box::new(MockBackend::new(
        pipeline.ingress(),
        config.sample_rate,
        440.0,
    )))
}

#[cfg(all(feature = "audio", not(feature = "mock-audio")))]
fn create_backend(
    pipeline: &AnalysisPipeline,
    config: &AnalysisConfig,
) -> Result<Box<dyn AudioBackend>> {
    use soundview_core::backend::cpal_backend::CpalBackend;
    Ok(Box::new(CpalBackend::new(
        pipeline.ingress(),
        config.sample_rate,
    )?))
}

#[cfg(not(any(feature = "audio", feature = "mock-audio")))]
fn create_backend(
    _pipeline: &AnalysisPipeline,
    _config: &AnalysisConfig,
) -> Result<Box<dyn AudioBackend>> {
    anyhow::bail!("built without an audio backend; enable the `audio` or `mock-audio` feature")
}

/// Drive the pipeline at a fixed cadence until the process is terminated.
fn run_analysis_loop(pipeline: &mut AnalysisPipeline) -> Result<()> {
    let tick_interval = Duration::from_secs_f64(1.0 / TICK_RATE_HZ as f64);
    let mut next_tick = Instant::now() + tick_interval;

    loop {
        if let Some(snapshot) = pipeline.tick() {
            if snapshot.tick % REPORT_EVERY_TICKS == 0 {
                report(pipeline, &snapshot);
            }
        }

        let now = Instant::now();
        if next_tick > now {
            thread::sleep(next_tick - now);
        }
        next_tick += tick_interval;
    }
}

fn report(pipeline: &AnalysisPipeline, snapshot: &AnalysisSnapshot) {
    let floor = pipeline.config().db_floor;

    // Spectrum peak, skipping the DC bin.
    let peak = snapshot
        .rta_amplitudes
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal));
    if let Some((bin, &amplitude)) = peak {
        let frequency = snapshot.bin_frequencies[bin];
        let db = amplitude_to_dbfs(amplitude, floor);
        info!("peak {frequency:.1} Hz at {db:.1} dBFS (bin {bin})");
    }

    let health = &snapshot.health;
    info!(
        "health: zeroed={} clipped={} invalid={} xruns={} callback={:.3} ms",
        health.samples.zeroed,
        health.samples.clipped,
        health.samples.invalid,
        health.xruns,
        health.mean_callback_ms
    );
    if health.samples.invalid > 0 {
        warn!("input contains out-of-range samples");
    }

    let stats = pipeline.stats();
    info!(
        "stats: {} samples in, {} ticks analyzed, {} skipped, buffer {:.0}%",
        stats.samples_ingested,
        stats.ticks_analyzed,
        stats.ticks_skipped,
        stats.buffer_fill * 100.0
    );
}
