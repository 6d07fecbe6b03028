//! Kernel smoothing across frequency bins.
//!
//! Convolves a curve with a normalized window kernel to knock down
//! bin-to-bin jitter along the frequency axis. Complements the temporal
//! averager, which smooths across frames rather than across bins.

use serde::{Deserialize, Serialize};

/// Kernel shape used by [`KernelSmoother`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SmoothingKernel {
    /// Equal weights
    #[default]
    Rectangular,
    /// Linear taper to the edges
    Triangle,
    /// Raised-cosine taper
    Hann,
}

/// Sliding-window convolution smoother for spectral curves.
///
/// The kernel width is forced odd and at least 3 so the output stays
/// aligned with the input; a width of 1 bypasses smoothing entirely. Edge
/// samples are replicated so the output has the same length as the input.
pub struct KernelSmoother {
    kernel: Vec<f32>,
    processing_buffer: Vec<f32>,
    active_width: usize,
    active_kernel: SmoothingKernel,
}

impl Default for KernelSmoother {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelSmoother {
    /// Create a smoother with no kernel computed yet.
    pub fn new() -> Self {
        Self {
            kernel: Vec::new(),
            processing_buffer: Vec::new(),
            active_width: 0,
            active_kernel: SmoothingKernel::Rectangular,
        }
    }

    /// Smooth `samples` with the given kernel shape and width.
    ///
    /// A width of 1 returns the input unchanged. Even widths are reduced to
    /// the next lower odd width, with a minimum of 3.
    pub fn process(
        &mut self,
        samples: &[f32],
        kernel: SmoothingKernel,
        width: usize,
    ) -> Vec<f32> {
        if width <= 1 {
            return samples.to_vec();
        }
        self.update_kernel(kernel, width);
        self.convolve(samples)
    }

    fn update_kernel(&mut self, kernel: SmoothingKernel, width: usize) {
        let mut width = width;
        if width % 2 == 0 {
            width -= 1;
        }
        let width = width.max(3);

        if self.active_width == width && self.active_kernel == kernel && !self.kernel.is_empty() {
            return;
        }
        self.active_width = width;
        self.active_kernel = kernel;

        let span = (width - 1) as f32;
        self.kernel = (0..width)
            .map(|n| match kernel {
                SmoothingKernel::Rectangular => 1.0,
                SmoothingKernel::Triangle => {
                    1.0 - ((n as f32 - span / 2.0) / (span / 2.0)).abs()
                }
                SmoothingKernel::Hann => {
                    (std::f32::consts::PI * n as f32 / span).sin().powi(2)
                }
            })
            .collect();

        // Renormalize so the kernel preserves overall level.
        let sum: f32 = self.kernel.iter().sum();
        for weight in &mut self.kernel {
            *weight /= sum;
        }
    }

    fn convolve(&mut self, samples: &[f32]) -> Vec<f32> {
        if samples.is_empty() {
            return Vec::new();
        }

        let overhang = (self.kernel.len() - 1) / 2;
        let padded_len = samples.len() + overhang * 2;

        self.processing_buffer.clear();
        self.processing_buffer.resize(padded_len, 0.0);
        self.processing_buffer[overhang..overhang + samples.len()].copy_from_slice(samples);

        // Replicate the edge samples into the padding.
        let first = samples[0];
        let last = samples[samples.len() - 1];
        for slot in &mut self.processing_buffer[..overhang] {
            *slot = first;
        }
        for slot in &mut self.processing_buffer[overhang + samples.len()..] {
            *slot = last;
        }

        let kernel_len = self.kernel.len();
        (0..samples.len())
            .map(|out| {
                let mut acc = 0.0;
                for index in 0..kernel_len {
                    acc += self.processing_buffer[out + index] * self.kernel[kernel_len - 1 - index];
                }
                acc
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_one_is_passthrough() {
        let mut smoother = KernelSmoother::new();
        let input = vec![1.0, -2.0, 3.0, -4.0];
        assert_eq!(
            smoother.process(&input, SmoothingKernel::Hann, 1),
            input
        );
    }

    #[test]
    fn test_constant_input_is_a_fixed_point() {
        let mut smoother = KernelSmoother::new();
        let input = vec![0.5; 16];
        for kernel in [
            SmoothingKernel::Rectangular,
            SmoothingKernel::Triangle,
            SmoothingKernel::Hann,
        ] {
            let output = smoother.process(&input, kernel, 5);
            assert_eq!(output.len(), input.len());
            for &value in &output {
                assert!((value - 0.5).abs() < 1e-5, "{kernel:?} drifted to {value}");
            }
        }
    }

    #[test]
    fn test_even_width_behaves_as_next_lower_odd() {
        let mut smoother = KernelSmoother::new();
        let input = vec![0.0, 0.0, 1.0, 0.0, 0.0];

        let even = smoother.process(&input, SmoothingKernel::Rectangular, 4);
        let odd = smoother.process(&input, SmoothingKernel::Rectangular, 3);
        assert_eq!(even, odd);
    }

    #[test]
    fn test_rectangular_is_a_box_average() {
        let mut smoother = KernelSmoother::new();
        let input = vec![0.0, 0.0, 3.0, 0.0, 0.0];
        let output = smoother.process(&input, SmoothingKernel::Rectangular, 3);

        assert!((output[1] - 1.0).abs() < 1e-6);
        assert!((output[2] - 1.0).abs() < 1e-6);
        assert!((output[3] - 1.0).abs() < 1e-6);
        assert!(output[0].abs() < 1e-6);
        assert!(output[4].abs() < 1e-6);
    }

    #[test]
    fn test_output_length_matches_input() {
        let mut smoother = KernelSmoother::new();
        let input: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let output = smoother.process(&input, SmoothingKernel::Triangle, 9);
        assert_eq!(output.len(), 100);
    }
}
