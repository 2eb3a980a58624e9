//! Liveness score fusion and guidance classification
//!
//! Fuses blink count, movement magnitude, and expression variability into a
//! single bounded score, then derives the user-facing guidance message and
//! verification state from the score and its constituent signals. The state
//! is re-derived every frame; nothing here persists between frames.

use crate::types::{Expressions, LivenessState};

/// Score contribution per observed blink
pub const BLINK_WEIGHT: f64 = 0.3;

/// Score contribution per unit of average jitter
pub const MOVEMENT_WEIGHT: f64 = 2.0;

/// Score contribution of the strongest expression probability
pub const EXPRESSION_WEIGHT: f64 = 0.3;

/// Score above which the subject is a verification candidate
pub const VERIFY_SCORE: f64 = 0.7;

/// Blinks required before verification completes
pub const REQUIRED_BLINKS: u32 = 2;

/// Minimum average jitter required before verification completes
pub const MIN_MOVEMENT: f64 = 0.1;

// The three weights mix a count, a pixel average, and a probability. They
// are empirically tuned against real capture sessions; do not normalise
// the units without re-tuning every threshold above.

/// Outcome of scoring one frame's signals
#[derive(Debug, Clone)]
pub struct Verdict {
    /// Fused confidence in [0, 1]
    pub score: f64,
    /// Verification state derived from the same branch as the message
    pub state: LivenessState,
    /// User-facing guidance
    pub message: String,
}

/// Stateless score fusion over the live counters
pub struct LivenessScorer;

impl LivenessScorer {
    /// Fuse the current signals into a score, state, and guidance message.
    ///
    /// Message selection is priority-ordered; the first matching branch
    /// wins, and the state is derived from that same branch.
    pub fn assess(blink_count: u32, movement: f64, expressions: &Expressions) -> Verdict {
        let expression_change = expressions.strongest();
        let raw = blink_count as f64 * BLINK_WEIGHT
            + movement * MOVEMENT_WEIGHT
            + expression_change * EXPRESSION_WEIGHT;
        let score = raw.min(1.0);

        let (state, message) = if score > VERIFY_SCORE && blink_count < REQUIRED_BLINKS {
            (
                LivenessState::AwaitingBlinks,
                format!(
                    "Keep blinking naturally ({}/{})",
                    blink_count, REQUIRED_BLINKS
                ),
            )
        } else if score > VERIFY_SCORE && movement < MIN_MOVEMENT {
            (
                LivenessState::AwaitingMovement,
                "Move your head slightly from side to side".to_string(),
            )
        } else if score > VERIFY_SCORE {
            (
                LivenessState::Verified,
                "Verified: live subject present".to_string(),
            )
        } else {
            (
                LivenessState::Searching,
                "Position your face in the frame and blink naturally".to_string(),
            )
        };

        Verdict {
            score,
            state,
            message,
        }
    }

    /// Verdict for a frame where the detector found no face.
    ///
    /// Overrides the message and reports a score of 0 for the frame;
    /// the session's counters themselves are untouched by the caller.
    pub fn no_face() -> Verdict {
        Verdict {
            score: 0.0,
            state: LivenessState::Searching,
            message: "No face detected. Center your face in the frame".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expressions(strongest: f64) -> Expressions {
        Expressions {
            happy: 0.0,
            surprised: 0.0,
            neutral: strongest,
        }
    }

    #[test]
    fn test_score_formula() {
        let verdict = LivenessScorer::assess(1, 0.05, &expressions(0.5));
        // 1 * 0.3 + 0.05 * 2 + 0.5 * 0.3 = 0.55
        assert!((verdict.score - 0.55).abs() < 1e-12);
        assert_eq!(verdict.state, LivenessState::Searching);
    }

    #[test]
    fn test_score_caps_at_one() {
        let verdict = LivenessScorer::assess(50, 100.0, &expressions(1.0));
        assert_eq!(verdict.score, 1.0);
    }

    #[test]
    fn test_score_monotone_in_each_signal() {
        let base = LivenessScorer::assess(1, 0.05, &expressions(0.2)).score;
        assert!(LivenessScorer::assess(2, 0.05, &expressions(0.2)).score >= base);
        assert!(LivenessScorer::assess(1, 0.10, &expressions(0.2)).score >= base);
        assert!(LivenessScorer::assess(1, 0.05, &expressions(0.4)).score >= base);
    }

    #[test]
    fn test_high_score_but_few_blinks_awaits_blinks() {
        // movement alone pushes the score past the gate
        let verdict = LivenessScorer::assess(1, 0.5, &expressions(0.0));
        assert!(verdict.score > VERIFY_SCORE);
        assert_eq!(verdict.state, LivenessState::AwaitingBlinks);
        assert!(verdict.message.contains("1/2"));
    }

    #[test]
    fn test_high_score_but_still_head_awaits_movement() {
        let verdict = LivenessScorer::assess(3, 0.01, &expressions(0.0));
        assert!(verdict.score > VERIFY_SCORE);
        assert_eq!(verdict.state, LivenessState::AwaitingMovement);
    }

    #[test]
    fn test_all_gates_pass_verifies() {
        let verdict = LivenessScorer::assess(2, 0.15, &expressions(0.5));
        // 0.6 + 0.3 + 0.15 = 1.05 capped at 1.0
        assert_eq!(verdict.score, 1.0);
        assert_eq!(verdict.state, LivenessState::Verified);
        assert!(verdict.message.starts_with("Verified"));
    }

    #[test]
    fn test_low_score_searches() {
        let verdict = LivenessScorer::assess(0, 0.0, &expressions(0.1));
        assert_eq!(verdict.state, LivenessState::Searching);
    }

    #[test]
    fn test_no_face_override() {
        let verdict = LivenessScorer::no_face();
        assert_eq!(verdict.score, 0.0);
        assert_eq!(verdict.state, LivenessState::Searching);
        assert!(verdict.message.contains("No face"));
    }

    #[test]
    fn test_expression_change_uses_strongest() {
        let mixed = Expressions {
            happy: 0.9,
            surprised: 0.1,
            neutral: 0.2,
        };
        let verdict = LivenessScorer::assess(0, 0.0, &mixed);
        assert!((verdict.score - 0.27).abs() < 1e-12);
    }
}
