//! Head-movement estimation
//!
//! Tracks the nose reference point across frames and reports average
//! per-step jitter rather than net displacement: a subject rocking back and
//! forth keeps registering movement even with zero net travel, which is
//! exactly the anti-photo signal we want. A static photo produces only
//! sensor-noise-level jitter.

use std::collections::VecDeque;

use crate::geometry::Point2D;

/// Nose positions kept in the rolling window
pub const POSITION_WINDOW: usize = 10;

/// Bounded FIFO window of nose positions with per-step jitter derivation
#[derive(Debug, Clone)]
pub struct MovementEstimator {
    window: VecDeque<Point2D>,
    capacity: usize,
}

impl Default for MovementEstimator {
    fn default() -> Self {
        Self::new(POSITION_WINDOW)
    }
}

impl MovementEstimator {
    /// Create an estimator with the given window capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a nose position and return the average per-step jitter.
    ///
    /// Jitter is the sum of Manhattan distances over consecutive position
    /// pairs divided by the window length. Fewer than 2 points yields 0.
    pub fn observe(&mut self, reference: Point2D) -> f64 {
        self.window.push_back(reference);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }

        if self.window.len() < 2 {
            return 0.0;
        }

        let mut total = 0.0;
        let mut iter = self.window.iter();
        let mut prev = iter.next().expect("window has at least 2 points");
        for point in iter {
            total += prev.manhattan_distance(point);
            prev = point;
        }

        total / self.window.len() as f64
    }

    /// Number of positions currently held
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether no positions have been recorded yet
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
