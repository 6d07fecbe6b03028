//! Windowed FFT spectral engine.
//!
//! Applies a Hann analysis window, runs a forward transform via `rustfft`,
//! and produces per-bin magnitudes normalized by the transform size.

use crate::{CoreError, Result};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;
use tracing::debug;

/// Generate the Hann window coefficient table for `fft_size` samples.
///
/// `w[n] = 0.5 * (1 - cos(2*pi*n / (N - 1)))`
pub fn hann_window(fft_size: usize) -> Vec<f32> {
    (0..fft_size)
        .map(|n| {
            let phase = (2.0 * std::f32::consts::PI * n as f32) / (fft_size - 1) as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Linear frequency axis for the transform output.
///
/// `freq[k] = k * sample_rate / fft_size`, with `freq[0] = 0` for the DC bin.
/// The axis has `fft_size / 2 + 1` entries, matching the magnitude output of
/// [`SpectralEngine::process`].
pub fn bin_frequencies(sample_rate: u32, fft_size: usize) -> Vec<f32> {
    let num_bins = fft_size / 2 + 1;
    (0..num_bins)
        .map(|k| k as f32 * sample_rate as f32 / fft_size as f32)
        .collect()
}

/// Windowed FFT engine producing normalized per-bin magnitudes.
///
/// All working buffers are owned by the engine and live for its lifetime;
/// they are reallocated only when the FFT size changes.
pub struct SpectralEngine {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,

    /// Hann window coefficients, one per input sample
    window: Vec<f32>,

    /// In-place transform buffer
    fft_buffer: Vec<Complex<f32>>,

    /// Scratch space required by the planned transform
    scratch_buffer: Vec<Complex<f32>>,

    /// Magnitudes for the non-negative frequency bins
    magnitude_buffer: Vec<f32>,
}

impl SpectralEngine {
    /// Plan a forward transform of `fft_size` samples.
    ///
    /// `fft_size` must be a power of two, at least 2.
    pub fn new(fft_size: usize) -> Result<Self> {
        if fft_size < 2 || !fft_size.is_power_of_two() {
            return Err(CoreError::InvalidConfig(format!(
                "FFT size must be a power of two >= 2, got {}",
                fft_size
            )));
        }

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();
        let num_bins = fft_size / 2 + 1;

        debug!("spectral engine planned: fft_size={fft_size}, bins={num_bins}");

        Ok(Self {
            fft,
            fft_size,
            window: hann_window(fft_size),
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch_buffer: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitude_buffer: vec![0.0; num_bins],
        })
    }

    /// Window, transform, and normalize one snapshot of samples.
    ///
    /// `samples` must hold exactly `fft_size` values; the upstream tick is
    /// responsible for not running the engine before enough samples are
    /// buffered. Returns the magnitudes of the `fft_size / 2 + 1`
    /// non-negative frequency bins, normalized by the transform size.
    pub fn process(&mut self, samples: &[f32]) -> &[f32] {
        assert_eq!(
            samples.len(),
            self.fft_size,
            "spectral engine fed a snapshot of the wrong length"
        );

        for (slot, (&sample, &weight)) in self
            .fft_buffer
            .iter_mut()
            .zip(samples.iter().zip(self.window.iter()))
        {
            *slot = Complex::new(sample * weight, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch_buffer);

        // norm() of bin / N equals the magnitude of the N-normalized
        // complex output.
        let norm = 1.0 / self.fft_size as f32;
        for (magnitude, bin) in self.magnitude_buffer.iter_mut().zip(self.fft_buffer.iter()) {
            *magnitude = bin.norm() * norm;
        }

        &self.magnitude_buffer
    }

    /// Current transform size.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of non-negative frequency bins produced per transform.
    pub fn num_bins(&self) -> usize {
        self.magnitude_buffer.len()
    }

    /// Re-plan for a new transform size, recomputing the window table and
    /// reallocating all working buffers.
    pub fn set_fft_size(&mut self, fft_size: usize) -> Result<()> {
        if fft_size == self.fft_size {
            return Ok(());
        }
        *self = Self::new(fft_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(SpectralEngine::new(1000).is_err());
        assert!(SpectralEngine::new(0).is_err());
        assert!(SpectralEngine::new(1).is_err());
        assert!(SpectralEngine::new(1024).is_ok());
    }

    #[test]
    fn test_hann_window_shape() {
        let window = hann_window(1024);
        assert_eq!(window.len(), 1024);
        // Endpoints are zero, center is one.
        assert!(window[0].abs() < 1e-6);
        assert!(window[1023].abs() < 1e-6);
        assert!((window[511] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_bin_frequencies() {
        let freqs = bin_frequencies(44100, 1024);
        assert_eq!(freqs.len(), 513);
        assert_eq!(freqs[0], 0.0);
        assert!((freqs[1] - 44100.0 / 1024.0).abs() < 1e-3);
        // Last bin sits at Nyquist.
        assert!((freqs[512] - 22050.0).abs() < 1e-2);
    }

    #[test]
    fn test_silence_yields_zero_magnitudes() {
        let mut engine = SpectralEngine::new(2048).unwrap();
        let silence = vec![0.0f32; 2048];
        let magnitudes = engine.process(&silence);

        assert_eq!(magnitudes.len(), 1025);
        for &magnitude in magnitudes {
            assert!(magnitude.abs() < 1e-9, "expected silence, got {magnitude}");
        }
    }

    #[test]
    fn test_sine_peak_lands_on_expected_bin() {
        let fft_size = 4096;
        let sample_rate = 44100.0;
        // Put the tone exactly on bin 100.
        let target_bin = 100;
        let frequency = target_bin as f32 * sample_rate / fft_size as f32;

        let samples: Vec<f32> = (0..fft_size)
            .map(|i| {
                (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate).sin() * 0.5
            })
            .collect();

        let mut engine = SpectralEngine::new(fft_size).unwrap();
        let magnitudes = engine.process(&samples);

        let peak_bin = magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(bin, _)| bin)
            .unwrap();

        assert!(
            (peak_bin as i64 - target_bin as i64).abs() <= 1,
            "peak at bin {peak_bin}, expected near {target_bin}"
        );
    }

    #[test]
    fn test_set_fft_size_resizes_buffers() {
        let mut engine = SpectralEngine::new(1024).unwrap();
        assert_eq!(engine.num_bins(), 513);

        engine.set_fft_size(2048).unwrap();
        assert_eq!(engine.fft_size(), 2048);
        assert_eq!(engine.num_bins(), 1025);

        // Invalid size leaves the engine untouched.
        assert!(engine.set_fft_size(3000).is_err());
        assert_eq!(engine.fft_size(), 2048);
    }
}
