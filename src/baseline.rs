//! Rolling eyes-open baseline
//!
//! The baseline approximates "EAR when the eyes are fully open" by assuming
//! the highest recent samples correspond to open-eye frames. This adapts
//! per-subject and per-lighting without any calibration step.

use std::collections::VecDeque;

/// Samples kept in the rolling EAR window
pub const EAR_WINDOW: usize = 10;

/// How many of the largest recent samples form the open-eye baseline
const BASELINE_TOP_N: usize = 3;

/// Bounded FIFO window of EAR samples with an on-demand baseline.
///
/// This is the single shared EAR history: blink detection and baseline
/// derivation operate on the same window so their thresholds stay coherent.
#[derive(Debug, Clone)]
pub struct RollingBaselineTracker {
    window: VecDeque<f64>,
    capacity: usize,
}

impl Default for RollingBaselineTracker {
    fn default() -> Self {
        Self::new(EAR_WINDOW)
    }
}

impl RollingBaselineTracker {
    /// Create a tracker with the given window capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest once the window is full
    pub fn push(&mut self, sample: f64) {
        self.window.push_back(sample);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }
    }

    /// Mean of the top-3 largest samples in the window.
    ///
    /// With fewer samples than that, averages over whatever is present;
    /// an empty window yields 0. Recomputed on demand, never cached.
    pub fn baseline(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.window.iter().copied().collect();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let n = sorted.len().min(BASELINE_TOP_N);
        sorted[..n].iter().sum::<f64>() / n as f64
    }

    /// The sample immediately preceding the most recent push
    pub fn second_last(&self) -> Option<f64> {
        if self.window.len() < 2 {
            return None;
        }
        self.window.get(self.window.len() - 2).copied()
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Samples in arrival order
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.window.iter().copied()
    }
}
