//! Sample history shared between the audio callback and the analysis tick.

use parking_lot::Mutex;
use std::collections::VecDeque;

/// Fixed-capacity history of the most recent raw input samples.
///
/// The audio callback pushes blocks in; the analysis tick copies snapshots
/// out. All mutation happens inside one short mutex section, and the backing
/// storage is never handed out to callers. The producer only ever pays for
/// the copy, never for consumer-side processing.
pub struct SampleHistory {
    inner: Mutex<Inner>,
}

struct Inner {
    /// Newest-first sample history
    samples: VecDeque<f32>,
    capacity: usize,
    /// Length of the block delivered by the most recent callback
    last_block_len: usize,
}

impl SampleHistory {
    /// Create a history holding up to `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                samples: VecDeque::with_capacity(capacity),
                capacity,
                last_block_len: 0,
            }),
        }
    }

    /// Append one callback block, discarding the oldest samples once the
    /// history exceeds its capacity.
    pub fn push_block(&self, samples: &[f32]) {
        let mut inner = self.inner.lock();
        for &sample in samples {
            inner.samples.push_front(sample);
        }
        let capacity = inner.capacity;
        inner.samples.truncate(capacity);
        inner.last_block_len = samples.len();
    }

    /// Copy the `n` most recent samples in arrival order (oldest first).
    ///
    /// Returns `None` until at least `n` samples have been buffered; the
    /// caller is expected to retry on a later tick.
    pub fn snapshot(&self, n: usize) -> Option<Vec<f32>> {
        let inner = self.inner.lock();
        if inner.samples.len() < n {
            return None;
        }
        let mut out: Vec<f32> = inner.samples.iter().take(n).copied().collect();
        out.reverse();
        Some(out)
    }

    /// Copy the samples delivered by the most recent callback, oldest first.
    pub fn latest_block(&self) -> Vec<f32> {
        let inner = self.inner.lock();
        let n = inner.last_block_len.min(inner.samples.len());
        let mut out: Vec<f32> = inner.samples.iter().take(n).copied().collect();
        out.reverse();
        out
    }

    /// Number of samples currently buffered.
    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    /// `true` while no samples have been buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity
    }

    /// Change the capacity, trimming the oldest samples if it shrinks.
    pub fn set_capacity(&self, capacity: usize) {
        let mut inner = self.inner.lock();
        inner.capacity = capacity;
        inner.samples.truncate(capacity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_requires_enough_samples() {
        let history = SampleHistory::new(8);
        assert!(history.snapshot(1).is_none());

        history.push_block(&[1.0, 2.0, 3.0]);
        assert!(history.snapshot(4).is_none());
        assert_eq!(history.snapshot(3), Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_capacity_trims_oldest() {
        let history = SampleHistory::new(4);
        history.push_block(&[1.0, 2.0, 3.0]);
        history.push_block(&[4.0, 5.0, 6.0]);

        assert_eq!(history.len(), 4);
        // The four most recent samples, in the order they arrived.
        assert_eq!(history.snapshot(4), Some(vec![3.0, 4.0, 5.0, 6.0]));
    }

    #[test]
    fn test_snapshot_is_chronological() {
        let history = SampleHistory::new(8);
        history.push_block(&[1.0, 2.0]);
        history.push_block(&[3.0, 4.0]);

        assert_eq!(history.snapshot(4), Some(vec![1.0, 2.0, 3.0, 4.0]));
        // Snapshots are copies; repeated reads observe the same state.
        assert_eq!(history.snapshot(4), Some(vec![1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_latest_block() {
        let history = SampleHistory::new(8);
        assert!(history.latest_block().is_empty());

        history.push_block(&[1.0, 2.0, 3.0]);
        history.push_block(&[4.0, 5.0]);
        assert_eq!(history.latest_block(), vec![4.0, 5.0]);
    }

    #[test]
    fn test_latest_block_clamped_by_capacity() {
        let history = SampleHistory::new(2);
        history.push_block(&[1.0, 2.0, 3.0, 4.0]);
        // Only two samples survive the trim.
        assert_eq!(history.latest_block(), vec![3.0, 4.0]);
    }

    #[test]
    fn test_set_capacity_shrinks_history() {
        let history = SampleHistory::new(8);
        history.push_block(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        history.set_capacity(3);
        assert_eq!(history.len(), 3);
        assert_eq!(history.snapshot(3), Some(vec![4.0, 5.0, 6.0]));
    }
}
