//! Synthetic capture backend for development without audio hardware.

use super::{AudioBackend, StreamInfo};
use crate::pipeline::AudioIngress;
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::info;

const BLOCK_SIZE: usize = 512;

/// Generates a fixed-frequency sine wave at block cadence on a worker
/// thread, exercising the same ingress path as a real device.
pub struct MockBackend {
    ingress: AudioIngress,
    info: StreamInfo,
    frequency: f32,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl MockBackend {
    /// Create a mock source producing a sine at `frequency` Hz.
    pub fn new(ingress: AudioIngress, sample_rate: u32, frequency: f32) -> Self {
        Self {
            ingress,
            info: StreamInfo {
                device_name: "mock".into(),
                sample_rate,
                channels: 1,
            },
            frequency,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl AudioBackend for MockBackend {
    fn start(&mut self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let ingress = self.ingress.clone();
        let running = Arc::clone(&self.running);
        let sample_rate = self.info.sample_rate;
        let frequency = self.frequency;
        let block_interval =
            Duration::from_secs_f64(BLOCK_SIZE as f64 / sample_rate as f64);

        info!("mock capture started: {frequency} Hz sine at {sample_rate} Hz");

        self.worker = Some(thread::spawn(move || {
            let mut position: u64 = 0;
            let mut block = vec![0.0f32; BLOCK_SIZE];
            while running.load(Ordering::SeqCst) {
                for (i, sample) in block.iter_mut().enumerate() {
                    let t = (position + i as u64) as f32 / sample_rate as f32;
                    *sample = (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.5;
                }
                position += BLOCK_SIZE as u64;
                ingress.push_block(&block);
                thread::sleep(block_interval);
            }
        }));
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    fn info(&self) -> &StreamInfo {
        &self.info
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{AnalysisConfig, AnalysisPipeline};

    #[test]
    fn test_mock_backend_feeds_pipeline() {
        let config = AnalysisConfig {
            fft_size: 1024,
            ..AnalysisConfig::default()
        };
        let pipeline = AnalysisPipeline::new(config).unwrap();
        let mut backend = MockBackend::new(pipeline.ingress(), 44100, 440.0);

        backend.start().unwrap();
        let deadline = std::time::Instant::now() + Duration::from_secs(2);
        while pipeline.stats().samples_ingested < 1024 {
            assert!(
                std::time::Instant::now() < deadline,
                "mock backend produced no samples"
            );
            thread::sleep(Duration::from_millis(5));
        }
        backend.stop();
    }
}
