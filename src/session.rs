//! Per-attempt session state
//!
//! A session owns every piece of cross-frame state the engine carries: the
//! shared EAR window (inside the blink detector), the blink counter, the
//! nose-position window, and the most recent assessment. One session per
//! verification attempt, touched only by the frame loop; nothing is shared
//! across sessions.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::blink::BlinkDetector;
use crate::ear;
use crate::movement::MovementEstimator;
use crate::scorer::LivenessScorer;
use crate::types::{
    DebugSignals, EyeState, FaceDetection, FrameAssessment, LivenessAssessment,
};

/// All state for one verification attempt
#[derive(Debug)]
pub struct LivenessSession {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    frame_seq: u64,
    blinks: BlinkDetector,
    movement: MovementEstimator,
    last: Option<FrameAssessment>,
}

impl Default for LivenessSession {
    fn default() -> Self {
        Self::new()
    }
}

impl LivenessSession {
    /// Start a fresh session with empty histories and a zero blink count
    pub fn new() -> Self {
        let session_id = Uuid::new_v4();
        info!(%session_id, "liveness session started");
        Self {
            session_id,
            started_at: Utc::now(),
            frame_seq: 0,
            blinks: BlinkDetector::new(),
            movement: MovementEstimator::default(),
            last: None,
        }
    }

    /// Process one frame. `None` means the detector ran but found no face.
    ///
    /// No-face frames leave every history and counter untouched; only the
    /// reported message and score change for that frame.
    pub fn process(&mut self, detection: Option<&FaceDetection>) -> FrameAssessment {
        self.frame_seq += 1;
        let assessment = match detection {
            Some(face) => self.assess_face(face),
            None => self.assess_no_face(),
        };
        self.last = Some(assessment.clone());
        assessment
    }

    fn assess_face(&mut self, face: &FaceDetection) -> FrameAssessment {
        let current_ear = ear::both_eyes_ear(&face.left_eye, &face.right_eye);
        let blink_count = self.blinks.observe(current_ear);

        // A missing nose point degrades to zero movement for this frame
        // without touching the position window.
        let movement = match face.nose {
            Some(nose) => self.movement.observe(nose),
            None => 0.0,
        };

        let verdict = LivenessScorer::assess(blink_count, movement, &face.expressions);
        let eye_state = if self.blinks.is_eye_closed(current_ear) {
            EyeState::Closed
        } else {
            EyeState::Open
        };

        debug!(
            frame = self.frame_seq,
            ear = current_ear,
            baseline = self.blinks.baseline(),
            score = verdict.score,
            state = ?verdict.state,
            "frame assessed"
        );

        FrameAssessment {
            frame_seq: self.frame_seq,
            face_detected: true,
            state: verdict.state,
            assessment: LivenessAssessment {
                score: verdict.score,
                message: verdict.message,
                eye_state,
                blink_count,
                movement,
            },
            debug: self.debug_signals(current_ear),
        }
    }

    fn assess_no_face(&self) -> FrameAssessment {
        let verdict = LivenessScorer::no_face();
        FrameAssessment {
            frame_seq: self.frame_seq,
            face_detected: false,
            state: verdict.state,
            assessment: LivenessAssessment {
                score: verdict.score,
                message: verdict.message,
                eye_state: EyeState::Open,
                blink_count: self.blinks.count(),
                movement: 0.0,
            },
            debug: self.debug_signals(self.blinks.last_ear()),
        }
    }

    fn debug_signals(&self, current_ear: f64) -> DebugSignals {
        DebugSignals {
            current_ear,
            baseline_ear: self.blinks.baseline(),
            blink_threshold: self.blinks.blink_threshold(),
            display_threshold: self.blinks.display_threshold(),
        }
    }

    /// Unique identifier of this session
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// When this session started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Frames processed so far (including no-face frames)
    pub fn frame_seq(&self) -> u64 {
        self.frame_seq
    }

    /// Cumulative blinks observed this session
    pub fn blink_count(&self) -> u32 {
        self.blinks.count()
    }

    /// Number of samples in the shared EAR window
    pub fn ear_history_len(&self) -> usize {
        self.blinks.history_len()
    }

    /// Number of positions in the nose window
    pub fn position_history_len(&self) -> usize {
        self.movement.len()
    }

    /// The most recent assessment, if any frame has been processed
    pub fn last_assessment(&self) -> Option<&FrameAssessment> {
        self.last.as_ref()
    }

    /// Discard all state and start over within the same session handle
    pub fn reset(&mut self) {
        info!(session_id = %self.session_id, "liveness session reset");
        self.started_at = Utc::now();
        self.frame_seq = 0;
        self.blinks = BlinkDetector::new();
        self.movement = MovementEstimator::default();
        self.last = None;
    }
}
