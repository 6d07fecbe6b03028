//! Signal health and callback performance monitoring.
//!
//! Inspects incoming audio blocks for degenerate sample values and keeps a
//! short rolling window of callback execution times. Everything here is
//! diagnostic: samples are read, never altered, and a degenerate block is a
//! metric, not an error.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// Rolling totals of degenerate samples reported by
/// [`SignalHealthMonitor::analyse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleCounts {
    /// Samples exactly equal to 0.0
    pub zeroed: usize,
    /// Samples exactly at full scale (|s| == 1.0)
    pub clipped: usize,
    /// Samples beyond full scale (|s| > 1.0)
    pub invalid: usize,
}

/// Classifies audio blocks and accumulates rolling per-block counts.
///
/// Each call to [`analyse`](Self::analyse) scans one block, pushes the
/// block's counts onto the front of the rolling history, trims the history
/// to `num_sampling_periods` blocks, and returns the summed totals.
pub struct SignalHealthMonitor {
    zeroed: VecDeque<usize>,
    clipped: VecDeque<usize>,
    invalid: VecDeque<usize>,
    num_sampling_periods: usize,
}

impl SignalHealthMonitor {
    /// Create a monitor summing over the most recent `num_sampling_periods`
    /// blocks.
    pub fn new(num_sampling_periods: usize) -> Self {
        let num_sampling_periods = num_sampling_periods.max(1);
        Self {
            zeroed: VecDeque::with_capacity(num_sampling_periods),
            clipped: VecDeque::with_capacity(num_sampling_periods),
            invalid: VecDeque::with_capacity(num_sampling_periods),
            num_sampling_periods,
        }
    }

    /// Scan one block and return the rolling totals over all retained
    /// sampling periods.
    pub fn analyse(&mut self, samples: &[f32]) -> SampleCounts {
        let mut block = SampleCounts::default();
        for &sample in samples {
            if sample == 0.0 {
                block.zeroed += 1;
            }
            if sample == 1.0 || sample == -1.0 {
                block.clipped += 1;
            }
            if sample > 1.0 || sample < -1.0 {
                block.invalid += 1;
            }
        }

        self.zeroed.push_front(block.zeroed);
        self.zeroed.truncate(self.num_sampling_periods);
        self.clipped.push_front(block.clipped);
        self.clipped.truncate(self.num_sampling_periods);
        self.invalid.push_front(block.invalid);
        self.invalid.truncate(self.num_sampling_periods);

        SampleCounts {
            zeroed: self.zeroed.iter().sum(),
            clipped: self.clipped.iter().sum(),
            invalid: self.invalid.iter().sum(),
        }
    }
}

/// Shared rolling window of audio callback execution times.
///
/// The producer records one duration per callback; the analysis tick reads
/// the mean. Both sides go through one short mutex section.
pub struct CallbackTimings {
    inner: Mutex<VecDeque<Duration>>,
    window: usize,
}

impl CallbackTimings {
    /// Keep the most recent `window` callback durations.
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            inner: Mutex::new(VecDeque::with_capacity(window)),
            window,
        }
    }

    /// Record one callback's execution time.
    pub fn record(&self, elapsed: Duration) {
        let mut timings = self.inner.lock();
        timings.push_front(elapsed);
        timings.truncate(self.window);
    }

    /// Mean execution time over the window, in milliseconds. Zero until the
    /// first callback has been recorded.
    pub fn mean_millis(&self) -> f32 {
        let timings = self.inner.lock();
        if timings.is_empty() {
            return 0.0;
        }
        let total: Duration = timings.iter().sum();
        (total.as_secs_f64() * 1000.0 / timings.len() as f64) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_degenerate_samples() {
        let mut monitor = SignalHealthMonitor::new(1);
        let block = [0.0, 0.0, 1.0, -1.0, 1.5, -1.5, 0.5, -0.5, 0.0, 1.0];
        let counts = monitor.analyse(&block);

        assert_eq!(counts.zeroed, 3);
        assert_eq!(counts.clipped, 3);
        assert_eq!(counts.invalid, 2);
    }

    #[test]
    fn test_clean_block_reports_nothing() {
        let mut monitor = SignalHealthMonitor::new(1);
        let counts = monitor.analyse(&[0.25, -0.75, 0.9999]);
        assert_eq!(counts, SampleCounts::default());
    }

    #[test]
    fn test_rolling_sums_across_periods() {
        let mut monitor = SignalHealthMonitor::new(2);

        let first = monitor.analyse(&[0.0, 0.0]);
        assert_eq!(first.zeroed, 2);

        // Second block adds to the rolling sum.
        let second = monitor.analyse(&[0.0, 1.0]);
        assert_eq!(second.zeroed, 3);
        assert_eq!(second.clipped, 1);

        // Third block evicts the first.
        let third = monitor.analyse(&[0.5]);
        assert_eq!(third.zeroed, 1);
        assert_eq!(third.clipped, 1);
    }

    #[test]
    fn test_single_period_forgets_previous_block() {
        let mut monitor = SignalHealthMonitor::new(1);
        monitor.analyse(&[0.0, 0.0, 0.0]);
        let counts = monitor.analyse(&[0.5, 0.5]);
        assert_eq!(counts.zeroed, 0);
    }

    #[test]
    fn test_timings_mean() {
        let timings = CallbackTimings::new(100);
        assert_eq!(timings.mean_millis(), 0.0);

        timings.record(Duration::from_millis(2));
        timings.record(Duration::from_millis(4));
        assert!((timings.mean_millis() - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_timings_window_evicts_oldest() {
        let timings = CallbackTimings::new(2);
        timings.record(Duration::from_millis(100));
        timings.record(Duration::from_millis(10));
        timings.record(Duration::from_millis(20));

        // The 100 ms outlier fell out of the window.
        assert!((timings.mean_millis() - 15.0).abs() < 1e-3);
    }
}
