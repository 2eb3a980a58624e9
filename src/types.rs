//! Contract types for the liveness pipeline
//!
//! This module defines the data structures that cross the engine boundary:
//! the per-frame detection record supplied by the external landmark detector,
//! and the per-frame assessment published to the rendering collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Point2D;

/// Number of landmarks in one eye contour.
///
/// Indices follow the fixed anatomical convention: 0 and 3 are the
/// horizontal corners, 1 and 2 the upper lid, 4 and 5 the lower lid.
pub const EYE_LANDMARK_COUNT: usize = 6;

/// Expression probabilities reported by the external detector, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Expressions {
    #[serde(default)]
    pub happy: f64,
    #[serde(default)]
    pub surprised: f64,
    #[serde(default)]
    pub neutral: f64,
}

impl Expressions {
    /// Strongest expression signal, used as the expression-variability term
    pub fn strongest(&self) -> f64 {
        self.happy.max(self.surprised).max(self.neutral)
    }

    /// Validate that all probabilities are within [0, 1]
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("happy", self.happy),
            ("surprised", self.surprised),
            ("neutral", self.neutral),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("expression '{}' out of range: {}", name, value));
            }
        }
        Ok(())
    }
}

/// One face detection from the external landmark detector
///
/// Eye landmark sets are expected to contain exactly [`EYE_LANDMARK_COUNT`]
/// points; shorter sets degrade to an EAR of zero rather than failing the
/// frame. A missing nose point degrades to zero movement for the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceDetection {
    /// Left-eye landmark contour (image-pixel coordinates)
    pub left_eye: Vec<Point2D>,
    /// Right-eye landmark contour (image-pixel coordinates)
    pub right_eye: Vec<Point2D>,
    /// Nose tip, the reference point for movement estimation
    pub nose: Option<Point2D>,
    /// Expression probabilities
    #[serde(default)]
    pub expressions: Expressions,
}

impl FaceDetection {
    /// Validate the detection record against the input contract.
    ///
    /// The pipeline itself absorbs malformed landmarks per frame; this check
    /// exists for the explicit `validate` surface (CLI, batch ingestion).
    pub fn validate(&self) -> Result<(), String> {
        if self.left_eye.len() != EYE_LANDMARK_COUNT {
            return Err(format!(
                "left eye has {} landmarks, expected {}",
                self.left_eye.len(),
                EYE_LANDMARK_COUNT
            ));
        }
        if self.right_eye.len() != EYE_LANDMARK_COUNT {
            return Err(format!(
                "right eye has {} landmarks, expected {}",
                self.right_eye.len(),
                EYE_LANDMARK_COUNT
            ));
        }
        if self.nose.is_none() {
            return Err("missing nose reference point".to_string());
        }
        self.expressions.validate()
    }
}

/// One frame of detector output as it arrives over the wire.
///
/// `face: None` means the detector ran but found no face in the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameInput {
    /// Detection result, absent when no face was found
    pub face: Option<FaceDetection>,
    /// When the frame was captured (defaults to processing time if absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_at: Option<DateTime<Utc>>,
}

impl FrameInput {
    /// Frame with no face detected
    pub fn no_face() -> Self {
        Self {
            face: None,
            observed_at: None,
        }
    }

    /// Frame carrying a face detection
    pub fn with_face(face: FaceDetection) -> Self {
        Self {
            face: Some(face),
            observed_at: None,
        }
    }
}

/// Instantaneous open/closed display classification of the eyes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EyeState {
    Open,
    Closed,
}

/// Verification state, re-derived every frame from the live counters.
///
/// There is no persistent state field anywhere in the engine: the state is a
/// stateless classification over the current score, blink count, and
/// movement signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivenessState {
    /// No face, or not enough combined evidence yet
    Searching,
    /// Score is high but too few blinks observed
    AwaitingBlinks,
    /// Score is high but head movement is below the live threshold
    AwaitingMovement,
    /// All evidence gates passed
    Verified,
}

/// The fused per-frame liveness verdict
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessAssessment {
    /// Fused confidence in [0, 1] that a live subject is present
    pub score: f64,
    /// User-facing guidance derived from the score and its constituents
    pub message: String,
    /// Display classification of the eyes for this frame
    pub eye_state: EyeState,
    /// Cumulative blinks observed this session
    pub blink_count: u32,
    /// Average per-step nose jitter (pixels)
    pub movement: f64,
}

/// Raw signal values published alongside the assessment for debug overlays
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DebugSignals {
    /// Mean EAR of both eyes for this frame
    pub current_ear: f64,
    /// Rolling eyes-open baseline
    pub baseline_ear: f64,
    /// Falling-edge threshold used for blink counting
    pub blink_threshold: f64,
    /// Coarser threshold used only for the open/closed display state
    pub display_threshold: f64,
}

/// Full result of processing one frame through the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameAssessment {
    /// Monotonic frame sequence number within the session
    pub frame_seq: u64,
    /// Whether the detector found a face in this frame
    pub face_detected: bool,
    /// Verification state derived from the current signals
    pub state: LivenessState,
    /// The fused verdict
    pub assessment: LivenessAssessment,
    /// Raw signals for rendering overlays
    pub debug: DebugSignals,
}

impl FrameAssessment {
    /// Whether this frame's evidence passed all verification gates
    pub fn is_live(&self) -> bool {
        self.state == LivenessState::Verified
    }
}

/// Engine metadata embedded in every published report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Provenance of a single report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    /// Session this frame belongs to
    pub session_id: String,
    /// Frame sequence number within the session
    pub frame_seq: u64,
    /// Capture time of the frame (RFC 3339)
    pub observed_at_utc: String,
    /// When the engine produced this report (RFC 3339)
    pub computed_at_utc: String,
}

/// The payload published to the rendering/UI collaborator once per frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    /// Report schema version
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    /// Whether the detector found a face in this frame
    pub face_detected: bool,
    /// Verification state derived from the current signals
    pub state: LivenessState,
    pub assessment: LivenessAssessment,
    pub debug: DebugSignals,
}
