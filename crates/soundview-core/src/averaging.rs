//! Temporal moving average over successive magnitude frames.

use std::collections::VecDeque;

/// Per-bin moving average across the most recent magnitude frames.
///
/// Each bin keeps its own bounded history of past values. The mean divides
/// by the number of frames actually collected, so the output is unbiased
/// while the history is still warming up; once `depth` frames have been
/// added it is a plain moving average over exactly `depth` frames.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    histories: Vec<VecDeque<f32>>,
    depth: usize,
}

impl MovingAverage {
    /// Create an averager over `num_bins` bins with a history of `depth`
    /// frames per bin.
    pub fn new(depth: usize, num_bins: usize) -> Self {
        let mut averager = Self {
            histories: Vec::new(),
            depth: depth.max(1),
        };
        averager.configure(depth, num_bins);
        averager
    }

    /// Reallocate for a new bin count and depth, discarding all history.
    pub fn configure(&mut self, depth: usize, num_bins: usize) {
        self.depth = depth.max(1);
        self.histories = (0..num_bins)
            .map(|_| VecDeque::with_capacity(self.depth))
            .collect();
    }

    /// Change the averaging depth without discarding history.
    ///
    /// Growing the depth widens the window as new frames arrive; shrinking
    /// it trims the oldest frames immediately.
    pub fn set_depth(&mut self, depth: usize) {
        self.depth = depth.max(1);
        for history in &mut self.histories {
            history.truncate(self.depth);
        }
    }

    /// Push one magnitude frame, evicting the oldest frame of any bin whose
    /// history exceeds the configured depth.
    pub fn add_frame(&mut self, frame: &[f32]) {
        assert_eq!(
            frame.len(),
            self.histories.len(),
            "magnitude frame does not match the configured bin count"
        );
        for (history, &value) in self.histories.iter_mut().zip(frame.iter()) {
            history.push_front(value);
            history.truncate(self.depth);
        }
    }

    /// Arithmetic mean of each bin's current history.
    ///
    /// Free of side effects; repeated calls return the same values until the
    /// next [`add_frame`](Self::add_frame).
    pub fn average(&self) -> Vec<f32> {
        self.histories
            .iter()
            .map(|history| {
                if history.is_empty() {
                    0.0
                } else {
                    history.iter().sum::<f32>() / history.len() as f32
                }
            })
            .collect()
    }

    /// Configured averaging depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of bins being averaged.
    pub fn num_bins(&self) -> usize {
        self.histories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steady_state_average_of_identical_frames() {
        let mut averager = MovingAverage::new(4, 3);
        for _ in 0..4 {
            averager.add_frame(&[2.0, 4.0, 8.0]);
        }
        assert_eq!(averager.average(), vec![2.0, 4.0, 8.0]);
    }

    #[test]
    fn test_oldest_frame_is_evicted() {
        let mut averager = MovingAverage::new(2, 1);
        averager.add_frame(&[10.0]);
        averager.add_frame(&[2.0]);
        averager.add_frame(&[4.0]);

        // The 10.0 frame fell out; only the two most recent remain.
        assert_eq!(averager.average(), vec![3.0]);
    }

    #[test]
    fn test_warm_up_averages_collected_frames_only() {
        let mut averager = MovingAverage::new(10, 2);
        averager.add_frame(&[1.0, 3.0]);
        averager.add_frame(&[3.0, 5.0]);

        // Two frames collected: divide by 2, not by the configured depth.
        assert_eq!(averager.average(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_average_is_idempotent() {
        let mut averager = MovingAverage::new(3, 2);
        averager.add_frame(&[1.0, 2.0]);

        let first = averager.average();
        let second = averager.average();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shrinking_depth_trims_history() {
        let mut averager = MovingAverage::new(4, 1);
        averager.add_frame(&[8.0]);
        averager.add_frame(&[4.0]);
        averager.add_frame(&[2.0]);

        averager.set_depth(2);
        // Only the two most recent frames survive.
        assert_eq!(averager.average(), vec![3.0]);
    }

    #[test]
    fn test_growing_depth_keeps_history() {
        let mut averager = MovingAverage::new(2, 1);
        averager.add_frame(&[2.0]);
        averager.add_frame(&[4.0]);

        averager.set_depth(4);
        assert_eq!(averager.average(), vec![3.0]);

        averager.add_frame(&[6.0]);
        averager.add_frame(&[8.0]);
        assert_eq!(averager.average(), vec![5.0]);
    }

    #[test]
    fn test_configure_resets_state() {
        let mut averager = MovingAverage::new(2, 2);
        averager.add_frame(&[1.0, 1.0]);

        averager.configure(3, 4);
        assert_eq!(averager.num_bins(), 4);
        assert_eq!(averager.depth(), 3);
        assert_eq!(averager.average(), vec![0.0; 4]);
    }
}
