//! Blink event detection
//!
//! A blink is counted on a falling-edge crossing: the previous EAR sample sat
//! above the blink threshold and the current one fell below it. Requiring the
//! transition (rather than merely "currently below threshold") means a
//! sustained closure of many consecutive frames counts exactly once.

use tracing::debug;

use crate::baseline::RollingBaselineTracker;

/// Fraction of the baseline below which a falling edge counts as a blink
pub const BLINK_EDGE_RATIO: f64 = 0.65;

/// Fraction of the baseline for the instantaneous open/closed display
/// classification. Deliberately coarser than [`BLINK_EDGE_RATIO`] and used
/// only for state display, never for counting.
pub const DISPLAY_CLOSED_RATIO: f64 = 0.75;

/// Window length below which edges are not yet trusted
const MIN_SAMPLES_FOR_EDGE: usize = 3;

/// Stateful blink detector owning the shared EAR window.
///
/// The tracker inside is the one rolling history used both for the baseline
/// and for edge detection; keeping a second copy would let the two
/// thresholds drift apart.
#[derive(Debug, Clone, Default)]
pub struct BlinkDetector {
    tracker: RollingBaselineTracker,
    count: u32,
    last_ear: f64,
}

impl BlinkDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one EAR sample and return the updated cumulative blink count.
    ///
    /// The sample is pushed into the shared window first, so the threshold
    /// for this frame already reflects the current sample. The count is
    /// monotonically non-decreasing for the life of the session.
    pub fn observe(&mut self, current_ear: f64) -> u32 {
        self.tracker.push(current_ear);

        let threshold = self.blink_threshold();
        if self.tracker.len() >= MIN_SAMPLES_FOR_EDGE {
            if let Some(prev) = self.tracker.second_last() {
                if prev > threshold && current_ear < threshold {
                    self.count += 1;
                    debug!(
                        count = self.count,
                        ear = current_ear,
                        threshold,
                        "blink edge detected"
                    );
                }
            }
        }

        self.last_ear = current_ear;
        self.count
    }

    /// Cumulative blinks observed this session
    pub fn count(&self) -> u32 {
        self.count
    }

    /// The most recent EAR sample observed
    pub fn last_ear(&self) -> f64 {
        self.last_ear
    }

    /// Current eyes-open baseline over the shared window
    pub fn baseline(&self) -> f64 {
        self.tracker.baseline()
    }

    /// Falling-edge threshold for blink counting
    pub fn blink_threshold(&self) -> f64 {
        self.tracker.baseline() * BLINK_EDGE_RATIO
    }

    /// Coarser threshold for the open/closed display classification
    pub fn display_threshold(&self) -> f64 {
        self.tracker.baseline() * DISPLAY_CLOSED_RATIO
    }

    /// Display-oriented classification of an EAR value
    pub fn is_eye_closed(&self, ear: f64) -> bool {
        ear < self.display_threshold()
    }

    /// Number of samples in the shared EAR window
    pub fn history_len(&self) -> usize {
        self.tracker.len()
    }
}
